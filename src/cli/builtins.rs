// src/cli/builtins.rs

//! Built-in verbs every engine carries: `help`, `env`, `exit`, and the
//! hidden `echo` fallback the loop uses to display errors for unmatched
//! input.

use anyhow::Result;
use async_trait::async_trait;
use colored::Color;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::environment::EnvSelector;
use crate::core::sources::{Handler, HandlerContext, InstanceSource};
use crate::errors::{EnvironmentError, ShellError};
use crate::models::{HandlerInfo, RunMode, Verb};

/// The built-in source, appended to every chain unless the builder opts out.
pub fn source() -> Result<InstanceSource, ShellError> {
    InstanceSource::new()
        .instance(
            HandlerInfo::new("help", "List available verbs or show usage for one.")
                .usage("help [verb...] [-all] [prefix=<text>]")
                .group("core"),
            Arc::new(HelpHandler),
        )?
        .instance(
            HandlerInfo::new("env", "Show or select the active environment.")
                .usage("env [list | clear | <name-or-index>]")
                .group("core"),
            Arc::new(EnvHandler),
        )?
        .instance(
            HandlerInfo::new("exit", "Leave the interactive loop.")
                .usage("exit")
                .group("core"),
            Arc::new(ExitHandler),
        )?
        .instance(
            HandlerInfo::new("echo", "Print the remaining arguments.")
                .usage("echo [text...]")
                .hidden(),
            Arc::new(EchoHandler),
        )
}

// --- help ---

struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let show_all = ctx.args.flag("all").is_present();
        let prefix = ctx.args.named("prefix");
        let prefix = prefix.value().filter(|p| !p.is_empty()).map(str::to_string);
        let words: Vec<String> = ctx
            .args
            .take_positionals()
            .iter()
            .filter_map(|a| a.value())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        if !words.is_empty() {
            let verb = Verb::from_words(&words)?;
            let Some(info) = ctx.registry.find(&verb) else {
                return Err(ShellError::VerbNotFound {
                    verb: Some(verb.text()),
                }
                .into());
            };
            ctx.output
                .with_color(Color::Cyan)
                .line(&format!("{}: {}", info.verb, info.description));
            if !info.usage.is_empty() {
                ctx.output.line(&format!("  usage: {}", info.usage));
            }
            return Ok(());
        }

        // Grouped overview of every matching registration.
        let mut groups: BTreeMap<String, Vec<HandlerInfo>> = BTreeMap::new();
        for info in ctx.registry.entries() {
            if info.hidden && !show_all {
                continue;
            }
            if let Some(p) = &prefix
                && !info.verb.starts_with(p.as_str())
            {
                continue;
            }
            groups.entry(info.group.clone()).or_default().push(info);
        }
        for (group, mut entries) in groups {
            ctx.output.with_color(Color::Green).line(&format!("{group}:"));
            entries.sort_by(|a, b| a.verb.cmp(&b.verb));
            for info in entries {
                ctx.output
                    .line(&format!("  {:<18} {}", info.verb, info.description));
            }
        }
        Ok(())
    }
}

// --- env ---

struct EnvHandler;

impl EnvHandler {
    fn select(ctx: &mut HandlerContext<'_>, selector: &EnvSelector) -> Result<()> {
        match ctx.environments.set_current(selector) {
            Ok(()) => {
                let name = ctx.environments.current_name()?.to_string();
                ctx.output.line(&format!("Environment set to '{name}'."));
                Ok(())
            }
            // Re-selecting the current environment is informational.
            Err(EnvironmentError::NotChanged) => {
                let name = ctx.environments.current_name()?.to_string();
                ctx.output
                    .line(&format!("Environment '{name}' is already current."));
                Ok(())
            }
            Err(e) => Err(ShellError::Environment(e).into()),
        }
    }

    fn list(ctx: &mut HandlerContext<'_>) {
        let current = ctx.environments.current_name().ok().map(str::to_string);
        for (index, name) in ctx.environments.names().iter().enumerate() {
            let marker = if Some(name.as_str()) == current.as_deref() {
                "*"
            } else {
                " "
            };
            ctx.output.line(&format!("{marker} [{index}] {name}"));
        }
    }
}

#[async_trait]
impl Handler for EnvHandler {
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let sub = ctx.args.shift();
        match sub.value() {
            Some("list") => {
                Self::list(ctx);
                Ok(())
            }
            Some("clear") => {
                ctx.environments
                    .clear_cache()
                    .map_err(ShellError::Environment)?;
                ctx.output
                    .line("Cached data for the current environment cleared.");
                Ok(())
            }
            Some(token) if !token.is_empty() => Self::select(ctx, &EnvSelector::parse(token)),
            // No selector given: auto-select when unambiguous, otherwise
            // prompt, which headless mode cannot do.
            _ => {
                if ctx.environments.len() == 1 {
                    return Self::select(ctx, &EnvSelector::Index(0));
                }
                if ctx.state.mode == RunMode::Headless {
                    return Err(ShellError::Environment(
                        EnvironmentError::NoneSpecifiedHeadless,
                    )
                    .into());
                }
                let names = ctx.environments.names().to_vec();
                match ctx.input.select("Select an environment", &names)? {
                    Some(index) => Self::select(ctx, &EnvSelector::Index(index)),
                    None => {
                        Err(ShellError::Environment(EnvironmentError::NoneSpecified).into())
                    }
                }
            }
        }
    }
}

// --- exit ---

struct ExitHandler;

#[async_trait]
impl Handler for ExitHandler {
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        ctx.state.request_stop();
        Ok(())
    }
}

// --- echo ---

/// Prints its positional arguments. The run loop also synthesizes echo
/// commands to display parse and resolution errors interactively.
struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let parts: Vec<String> = ctx
            .args
            .take_positionals()
            .iter()
            .filter_map(|a| a.value())
            .map(str::to_string)
            .collect();
        ctx.output.line(&parts.join(" "));
        Ok(())
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use crate::core::engine::Engine;
    use crate::core::environment::EnvironmentCollection;
    use crate::core::output::OutputSink;
    use crate::core::sources::DelegateSource;
    use crate::errors::{EnvironmentError, ShellError};
    use crate::models::HandlerInfo;
    use crate::system::console::ConsoleInput;

    fn sample_source() -> DelegateSource {
        DelegateSource::new()
            .delegate(
                HandlerInfo::new("deploy all", "Deploy every target.")
                    .usage("deploy all [-force]")
                    .group("release"),
                |_ctx| Ok(()),
            )
            .unwrap()
            .delegate(
                HandlerInfo::new("deploy one", "Deploy a single target.").group("release"),
                |_ctx| Ok(()),
            )
            .unwrap()
            .delegate(
                HandlerInfo::new("status", "Show status.").group("info"),
                |_ctx| Ok(()),
            )
            .unwrap()
            .delegate(
                HandlerInfo::new("secret", "Internal probe.").hidden(),
                |_ctx| Ok(()),
            )
            .unwrap()
    }

    fn engine_with(input: ConsoleInput) -> Engine {
        Engine::builder()
            .source(Box::new(sample_source()))
            .output(OutputSink::memory())
            .input(input)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn help_lists_groups_and_omits_hidden_verbs() {
        let mut engine = engine_with(ConsoleInput::preset(Vec::<String>::new()));
        engine.run_headless(["help"]).await.unwrap();
        let out = engine.output().captured().join("\n");
        assert!(out.contains("release:"));
        assert!(out.contains("deploy all"));
        assert!(out.contains("status"));
        assert!(!out.contains("secret"));
        assert!(!out.contains("echo"));
    }

    #[tokio::test]
    async fn help_show_all_includes_hidden_verbs() {
        let mut engine = engine_with(ConsoleInput::preset(Vec::<String>::new()));
        engine.run_headless(["help -all"]).await.unwrap();
        let out = engine.output().captured().join("\n");
        assert!(out.contains("secret"));
        assert!(out.contains("echo"));
    }

    #[tokio::test]
    async fn help_prefix_filter_narrows_the_listing() {
        let mut engine = engine_with(ConsoleInput::preset(Vec::<String>::new()));
        engine.run_headless(["help prefix=deploy"]).await.unwrap();
        let out = engine.output().captured().join("\n");
        assert!(out.contains("deploy all"));
        assert!(out.contains("deploy one"));
        assert!(!out.contains("status"));
    }

    #[tokio::test]
    async fn help_for_one_verb_shows_usage() {
        let mut engine = engine_with(ConsoleInput::preset(Vec::<String>::new()));
        engine.run_headless(["help deploy all"]).await.unwrap();
        let out = engine.output().captured().join("\n");
        assert!(out.contains("Deploy every target."));
        assert!(out.contains("usage: deploy all [-force]"));
    }

    #[tokio::test]
    async fn help_for_unknown_verb_is_verb_not_found() {
        let mut engine = engine_with(ConsoleInput::preset(Vec::<String>::new()));
        // The failure happens inside the handler's body, so it is reported to
        // the sink without aborting the loop.
        engine.run_headless(["help nothing here"]).await.unwrap();
        let out = engine.output().captured().join("\n");
        assert!(out.contains("No handler found for verb 'nothing here'"));
    }

    #[tokio::test]
    async fn env_headless_without_name_among_many_fails_typed() {
        let mut engine = Engine::builder()
            .environments(EnvironmentCollection::new(["a", "b", "c"]).unwrap())
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        let err = engine.run_headless(["env"]).await.unwrap_err();
        assert!(matches!(
            err,
            ShellError::Environment(EnvironmentError::NoneSpecifiedHeadless)
        ));
    }

    #[tokio::test]
    async fn env_with_single_candidate_selects_automatically() {
        let mut engine = Engine::builder()
            .environments(EnvironmentCollection::new(["only"]).unwrap())
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        engine.run_headless(["env"]).await.unwrap();
        assert_eq!(engine.environments().current_name().unwrap(), "only");
    }

    #[tokio::test]
    async fn env_selects_by_index_and_lists_with_marker() {
        let mut engine = Engine::builder()
            .environments(EnvironmentCollection::new(["dev", "prod"]).unwrap())
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        engine.run_headless(["env 1", "env list"]).await.unwrap();
        let out = engine.output().captured().join("\n");
        assert!(out.contains("Environment set to 'prod'."));
        assert!(out.contains("* [1] prod"));
        assert!(out.contains("  [0] dev"));
    }

    #[tokio::test]
    async fn env_interactive_prompts_for_selection() {
        let mut engine = Engine::builder()
            .environments(EnvironmentCollection::new(["dev", "prod"]).unwrap())
            .output(OutputSink::memory())
            // First line answers the selection prompt, second exits the loop.
            .input(ConsoleInput::preset(["env", "prod", "exit"]))
            .build()
            .unwrap();
        engine.run_interactive().await.unwrap();
        assert_eq!(engine.environments().current_name().unwrap(), "prod");
    }

    #[tokio::test]
    async fn env_reselection_is_reported_not_failed() {
        let mut engine = Engine::builder()
            .environments(EnvironmentCollection::new(["dev", "prod"]).unwrap())
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        engine.run_headless(["env dev", "env dev"]).await.unwrap();
        let out = engine.output().captured().join("\n");
        assert!(out.contains("already current"));
    }
}

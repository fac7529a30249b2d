// src/core/engine.rs

//! # Engine
//!
//! The run-loop state machine. The engine owns the command queue, the
//! metadata cache (safety-valve counters, loop-detection flags), the
//! environment collection and the run mode, and drives each command through
//! parsing, verb resolution, alias rewriting, handler resolution and
//! execution.
//!
//! The loop is single-threaded and cooperative: exactly one command is
//! dispatched at a time, handlers run to completion before the next command
//! is considered, and cancellation is checked between commands and offered to
//! handlers, never forced.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use crate::CancellationToken;
use crate::constants::{
    DEFAULT_LOOP_LIMIT, META_STOP_REQUESTED, META_VALVE_COUNTER, META_VALVE_TRIPPED, PROMPT,
    VALVE_PROMPT,
};
use crate::core::environment::EnvironmentCollection;
use crate::core::grammars::Grammar;
use crate::core::output::OutputSink;
use crate::core::script::Script;
use crate::core::sources::{HandlerContext, HandlerSource, ResolverSeam, SourceChain};
use crate::errors::ShellError;
use crate::models::{
    Argument, Arguments, Command, CommandQueue, MetaValue, QueuedCommand, QueuedPayload, RunMode,
};
use crate::system::console::ConsoleInput;

// --- ENGINE STATE ---

/// Mutable state owned by the run loop: the pending-command queue, the
/// key/value metadata cache, and the current run mode. Single-writer by
/// construction; no locking.
#[derive(Debug)]
pub struct EngineState {
    pub queue: CommandQueue,
    pub mode: RunMode,
    metadata: HashMap<String, MetaValue>,
}

impl EngineState {
    pub fn new(mode: RunMode) -> Self {
        Self {
            queue: CommandQueue::default(),
            mode,
            metadata: HashMap::new(),
        }
    }

    pub fn counter(&self, key: &str) -> usize {
        match self.metadata.get(key) {
            Some(MetaValue::Counter(n)) => *n,
            _ => 0,
        }
    }

    pub fn set_counter(&mut self, key: &str, value: usize) {
        self.metadata
            .insert(key.to_string(), MetaValue::Counter(value));
    }

    pub fn increment(&mut self, key: &str) -> usize {
        let next = self.counter(key) + 1;
        self.set_counter(key, next);
        next
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.metadata.get(key), Some(MetaValue::Flag(true)))
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.metadata.insert(key.to_string(), MetaValue::Flag(value));
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetaValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.metadata
            .insert(key.to_string(), MetaValue::Text(value.into()));
    }

    /// Asks the loop to end after the current command (the `exit` verb).
    pub fn request_stop(&mut self) {
        self.set_flag(META_STOP_REQUESTED, true);
    }

    pub fn stop_requested(&self) -> bool {
        self.flag(META_STOP_REQUESTED)
    }
}

// --- RUN-LOOP PHASES ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopPhase {
    Idle,
    AwaitingInput,
    Dispatching,
}

// --- BUILDER ---

/// Explicit registration API for an [`Engine`]. Every setup conflict is
/// detected here, never at run time.
pub struct EngineBuilder {
    grammar: Grammar,
    sources: Vec<Box<dyn HandlerSource>>,
    aliases: Vec<(String, String)>,
    environments: Option<EnvironmentCollection>,
    limit: usize,
    clear_cache_on_switch: bool,
    on_environment_changed: Option<Script>,
    on_limit_reached: Option<Script>,
    output: OutputSink,
    input: Option<ConsoleInput>,
    cancellation: Option<CancellationToken>,
    builtins: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            grammar: Grammar::default(),
            sources: Vec::new(),
            aliases: Vec::new(),
            environments: None,
            limit: DEFAULT_LOOP_LIMIT,
            clear_cache_on_switch: false,
            on_environment_changed: None,
            on_limit_reached: None,
            output: OutputSink::stdout(),
            input: None,
            cancellation: None,
            builtins: true,
        }
    }
}

impl EngineBuilder {
    pub fn grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn source(mut self, source: Box<dyn HandlerSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.push((from.into(), to.into()));
        self
    }

    pub fn environments(mut self, environments: EnvironmentCollection) -> Self {
        self.environments = Some(environments);
        self
    }

    /// Bounds how many consecutive inputless commands may run before the
    /// safety valve trips. Zero is rejected at build time.
    pub fn loop_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn clear_cache_on_environment_change(mut self, clear: bool) -> Self {
        self.clear_cache_on_switch = clear;
        self
    }

    /// Script run (with no caller arguments) after a successful environment
    /// switch. Defaults to a no-op.
    pub fn on_environment_changed(mut self, script: Script) -> Self {
        self.on_environment_changed = Some(script);
        self
    }

    /// One-shot recovery script for a headless safety-valve trip. Without
    /// one, a headless trip is immediately fatal.
    pub fn on_limit_reached(mut self, script: Script) -> Self {
        self.on_limit_reached = Some(script);
        self
    }

    pub fn output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    pub fn input(mut self, input: ConsoleInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Skips registration of the built-in verbs. Mostly useful in tests.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    pub fn build(self) -> Result<Engine, ShellError> {
        if self.limit == 0 {
            return Err(ShellError::Build(
                "the loop limit must be at least 1".to_string(),
            ));
        }
        let mut chain = SourceChain::builder();
        for source in self.sources {
            chain = chain.source(source);
        }
        if self.builtins {
            chain = chain.source(Box::new(crate::cli::builtins::source()?));
            chain = chain.alias("quit", "exit");
        }
        for (from, to) in self.aliases {
            chain = chain.alias(from, to);
        }
        Ok(Engine {
            grammar: self.grammar,
            chain: chain.build()?,
            environments: self
                .environments
                .unwrap_or_else(EnvironmentCollection::default_single),
            state: EngineState::new(RunMode::Interactive),
            limit: self.limit,
            clear_cache_on_switch: self.clear_cache_on_switch,
            on_environment_changed: self.on_environment_changed,
            on_limit_reached: self.on_limit_reached,
            output: self.output,
            input: self.input.unwrap_or_else(ConsoleInput::terminal),
            cancellation: self.cancellation.unwrap_or_default(),
        })
    }
}

// --- ENGINE ---

pub struct Engine {
    grammar: Grammar,
    chain: SourceChain,
    environments: EnvironmentCollection,
    state: EngineState,
    limit: usize,
    clear_cache_on_switch: bool,
    on_environment_changed: Option<Script>,
    on_limit_reached: Option<Script>,
    output: OutputSink,
    input: ConsoleInput,
    cancellation: CancellationToken,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn environments(&self) -> &EnvironmentCollection {
        &self.environments
    }

    pub fn chain(&self) -> &SourceChain {
        &self.chain
    }

    /// Runs interactively: when the queue empties the loop prompts for a new
    /// line, until `exit`, end of input, or a fatal error.
    pub async fn run_interactive(&mut self) -> Result<(), ShellError> {
        self.state.mode = RunMode::Interactive;
        self.run_loop().await
    }

    /// Runs headlessly over an initial queue of command lines; each line
    /// counts as direct user input. The loop ends when the queue drains.
    pub async fn run_headless<I, S>(&mut self, initial: I) -> Result<(), ShellError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.mode = RunMode::Headless;
        for line in initial {
            self.state.queue.push(QueuedCommand::user(line));
        }
        self.run_loop().await
    }

    /// Headless run of the process's own command-line arguments, joined into
    /// one command.
    pub async fn run_with_args(&mut self, args: Vec<String>) -> Result<(), ShellError> {
        self.run_headless([args.join(" ")]).await
    }

    async fn run_loop(&mut self) -> Result<(), ShellError> {
        let mut phase = LoopPhase::Idle;
        loop {
            // Cancellation checkpoint between commands.
            if self.cancellation.load(Ordering::SeqCst) {
                return Err(ShellError::Interrupted);
            }
            phase = match phase {
                LoopPhase::Idle => {
                    if self.state.stop_requested() {
                        return Ok(());
                    }
                    if !self.state.queue.is_empty() {
                        LoopPhase::Dispatching
                    } else if self.state.mode == RunMode::Headless {
                        return Ok(());
                    } else {
                        LoopPhase::AwaitingInput
                    }
                }
                LoopPhase::AwaitingInput => {
                    let line = self
                        .input
                        .read_line(PROMPT)
                        .map_err(|e| ShellError::Execution(e.to_string()))?;
                    match line {
                        None => return Ok(()),
                        Some(line) if line.trim().is_empty() => LoopPhase::AwaitingInput,
                        Some(line) => {
                            self.state.queue.push(QueuedCommand::user(line));
                            LoopPhase::Idle
                        }
                    }
                }
                LoopPhase::Dispatching => {
                    let Some(queued) = self.state.queue.pop() else {
                        phase = LoopPhase::Idle;
                        continue;
                    };
                    match self.dispatch(queued).await {
                        Ok(()) => LoopPhase::Idle,
                        Err(e) if e.is_fatal() => {
                            self.output.error(&e.to_string());
                            return Err(e);
                        }
                        Err(e) => match self.state.mode {
                            // Headless failures must be visible to the host.
                            RunMode::Headless => return Err(e),
                            RunMode::Interactive => {
                                self.output.error(&e.to_string());
                                LoopPhase::Idle
                            }
                        },
                    }
                }
            };
        }
    }

    /// Drives a single queued command through the pipeline.
    async fn dispatch(&mut self, queued: QueuedCommand) -> Result<(), ShellError> {
        // --- Safety valve ---
        if queued.user_sourced {
            // Direct user input always resets the counter, in either mode.
            self.state.set_counter(META_VALVE_COUNTER, 0);
            self.state.set_flag(META_VALVE_TRIPPED, false);
        } else {
            let count = self.state.increment(META_VALVE_COUNTER);
            if count >= self.limit && !self.valve_tripped().await? {
                return Ok(());
            }
        }

        // --- Parse ---
        let args = match queued.payload {
            QueuedPayload::Parsed(args) => args,
            QueuedPayload::Raw(line) => {
                log::debug!("parsing line: {line:?}");
                match self.grammar.parse(&line) {
                    Ok(args) => args,
                    Err(e) => return self.reject(e),
                }
            }
        };

        // --- Verb resolution ---
        let (verb, consumed) = match self.chain.resolve_verb(&args) {
            Ok(found) => found,
            Err(e) => return self.reject(e),
        };
        let mut args = args;
        args.consume_leading_positionals(consumed);
        let mut command = Command::new(verb, args);
        self.chain.apply_alias(&mut command)?;
        log::debug!("dispatching verb '{}'", command.verb());

        // --- Handler resolution ---
        let handler = {
            let seam = ResolverSeam {
                grammar: &self.grammar,
                output: &self.output,
                environments: &self.environments,
                state: &self.state,
                registry: &self.chain,
            };
            self.chain.resolve(&command, &seam)?
        };
        let Some(handler) = handler else {
            return self.reject(ShellError::VerbNotFound {
                verb: Some(command.verb().text()),
            });
        };

        // --- Execute ---
        let env_before = self.environments.current_name().ok().map(str::to_string);
        let mut ctx = HandlerContext {
            verb: command.verb().clone(),
            args: command.args,
            output: &self.output,
            input: &self.input,
            state: &mut self.state,
            environments: &mut self.environments,
            registry: &self.chain,
            cancellation: &self.cancellation,
        };
        let result = handler.execute(&mut ctx).await;

        // Handler-body errors are reported and do not abort the loop, unless
        // they belong to a fatal category.
        if let Err(e) = result {
            match e.downcast::<ShellError>() {
                Ok(shell_error) if shell_error.is_fatal() => return Err(shell_error),
                Ok(shell_error) => self.output.error(&shell_error.to_string()),
                Err(other) => self.output.error(&format!("{other:#}")),
            }
        }

        // --- Environment-change protocol ---
        let env_after = self.environments.current_name().ok().map(str::to_string);
        if env_before != env_after {
            log::debug!(
                "environment switched: {:?} -> {:?}",
                env_before,
                env_after
            );
            if self.clear_cache_on_switch {
                let _ = self.environments.clear_cache();
            }
            if let Some(script) = &self.on_environment_changed {
                let mut no_args = Arguments::new();
                for derived in script.expand(&mut no_args)? {
                    self.state.queue.push(QueuedCommand::scripted(derived));
                }
            }
        }
        Ok(())
    }

    /// Handles a tripped safety valve. Returns `Ok(true)` when the current
    /// command may still run (interactive "continue" answered yes).
    async fn valve_tripped(&mut self) -> Result<bool, ShellError> {
        log::warn!(
            "safety valve tripped after {} consecutive scripted command(s)",
            self.limit
        );
        match self.state.mode {
            RunMode::Interactive => {
                let go_on = self
                    .input
                    .confirm(VALVE_PROMPT)
                    .map_err(|e| ShellError::Execution(e.to_string()))?;
                if go_on {
                    self.state.set_counter(META_VALVE_COUNTER, 0);
                    Ok(true)
                } else {
                    self.state.queue.clear();
                    self.output.line("Pending commands cleared.");
                    Ok(false)
                }
            }
            RunMode::Headless => {
                // No human to ask: drop everything pending and run the
                // one-shot recovery script. A second trip, or no recovery
                // script at all, is fatal rather than looping forever.
                self.state.queue.clear();
                if self.state.flag(META_VALVE_TRIPPED) {
                    return Err(ShellError::LoopLimitExceeded { limit: self.limit });
                }
                let Some(script) = &self.on_limit_reached else {
                    return Err(ShellError::LoopLimitExceeded { limit: self.limit });
                };
                self.state.set_flag(META_VALVE_TRIPPED, true);
                self.state.set_counter(META_VALVE_COUNTER, 0);
                let mut no_args = Arguments::new();
                for derived in script.expand(&mut no_args)? {
                    self.state.queue.push(QueuedCommand::scripted(derived));
                }
                Ok(false)
            }
        }
    }

    /// Policy for parse and verb-resolution failures while accepting the
    /// next command: interactively they become an echo/error-display command;
    /// headlessly they surface to the host.
    fn reject(&mut self, error: ShellError) -> Result<(), ShellError> {
        match self.state.mode {
            RunMode::Headless => Err(error),
            RunMode::Interactive => {
                let mut args = Arguments::new();
                args.push(Argument::positional("echo"));
                args.push(Argument::positional(format!("Error: {error}")));
                self.state.queue.push(QueuedCommand::scripted(args));
                Ok(())
            }
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::EnvironmentCollection;
    use crate::core::sources::DelegateSource;
    use crate::errors::EnvironmentError;
    use crate::models::HandlerInfo;

    /// A delegate that prints every argument it receives, used as a probe.
    fn say_source() -> DelegateSource {
        DelegateSource::new()
            .delegate(HandlerInfo::new("say", "print arguments"), |ctx| {
                let mut parts = Vec::new();
                loop {
                    let arg = ctx.args.shift();
                    match arg.value() {
                        Some(v) if arg.is_present() => parts.push(v.to_string()),
                        _ => break,
                    }
                }
                for named in ctx.args.take_named() {
                    if let (Some(n), Some(v)) = (named.name(), named.value()) {
                        parts.push(format!("{n}={v}"));
                    }
                }
                ctx.output.line(&parts.join(" "));
                Ok(())
            })
            .unwrap()
    }

    /// A delegate whose verb re-enqueues itself forever.
    fn runaway_source(verb: &str) -> DelegateSource {
        let line = verb.to_string();
        DelegateSource::new()
            .delegate(HandlerInfo::new(verb, "enqueue itself"), move |ctx| {
                ctx.enqueue(line.clone());
                Ok(())
            })
            .unwrap()
    }

    #[tokio::test]
    async fn headless_run_drains_queue_and_ends() {
        let mut engine = Engine::builder()
            .source(Box::new(say_source()))
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        engine.run_headless(["say hello", "say again"]).await.unwrap();
        assert_eq!(engine.output().captured(), ["hello", "again"]);
        assert!(engine.state().queue.is_empty());
    }

    #[tokio::test]
    async fn headless_runaway_script_trips_the_valve_fatally() {
        let mut engine = Engine::builder()
            .source(Box::new(runaway_source("loop")))
            .loop_limit(3)
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        let err = engine.run_headless(["loop"]).await.unwrap_err();
        assert!(matches!(err, ShellError::LoopLimitExceeded { limit: 3 }));
    }

    #[tokio::test]
    async fn headless_recovery_script_runs_once_then_second_trip_is_fatal() {
        let recovery = Script::new(
            HandlerInfo::new("on limit", "recovery"),
            vec!["loop".to_string()],
        )
        .unwrap();
        let mut engine = Engine::builder()
            .source(Box::new(runaway_source("loop")))
            .loop_limit(2)
            .on_limit_reached(recovery)
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        // The recovery script re-enters the runaway loop, so the second trip
        // must end the run instead of cycling forever.
        let err = engine.run_headless(["loop"]).await.unwrap_err();
        assert!(matches!(err, ShellError::LoopLimitExceeded { limit: 2 }));
    }

    #[tokio::test]
    async fn interactive_prompt_feeds_the_queue_until_exit() {
        let mut engine = Engine::builder()
            .source(Box::new(say_source()))
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(["say one", "", "say two", "exit"]))
            .build()
            .unwrap();
        engine.run_interactive().await.unwrap();
        assert_eq!(engine.output().captured(), ["one", "two"]);
    }

    #[tokio::test]
    async fn interactive_valve_declined_clears_queue_and_returns_to_prompt() {
        let mut engine = Engine::builder()
            .source(Box::new(runaway_source("loop")))
            .loop_limit(2)
            .output(OutputSink::memory())
            // "loop" floods the queue; "n" declines the valve prompt; then a
            // normal prompt read gets "exit".
            .input(ConsoleInput::preset(["loop", "n", "exit"]))
            .build()
            .unwrap();
        engine.run_interactive().await.unwrap();
        assert!(engine
            .output()
            .captured()
            .contains(&"Pending commands cleared.".to_string()));
        assert!(engine.state().queue.is_empty());
    }

    #[tokio::test]
    async fn interactive_valve_accepted_resets_counter_and_continues() {
        let mut engine = Engine::builder()
            .source(Box::new(runaway_source("loop")))
            .loop_limit(3)
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(["loop", "yes", "n", "exit"]))
            .build()
            .unwrap();
        engine.run_interactive().await.unwrap();
        // Accepted once (counter reset), declined on the second trip.
        assert!(engine
            .output()
            .captured()
            .contains(&"Pending commands cleared.".to_string()));
    }

    #[tokio::test]
    async fn interactive_unknown_verb_becomes_an_error_display_command() {
        let mut engine = Engine::builder()
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(["frobnicate now", "exit"]))
            .build()
            .unwrap();
        engine.run_interactive().await.unwrap();
        let captured = engine.output().captured().join("\n");
        assert!(captured.contains("frobnicate"));
    }

    #[tokio::test]
    async fn headless_unknown_verb_surfaces_to_the_host() {
        let mut engine = Engine::builder()
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        let err = engine.run_headless(["frobnicate"]).await.unwrap_err();
        assert!(matches!(err, ShellError::VerbNotFound { verb: Some(ref v) } if v == "frobnicate"));
    }

    #[tokio::test]
    async fn handler_error_is_reported_without_aborting_the_loop() {
        let failing = DelegateSource::new()
            .delegate(HandlerInfo::new("explode", "always fails"), |_ctx| {
                anyhow::bail!("boom")
            })
            .unwrap();
        let mut engine = Engine::builder()
            .source(Box::new(failing))
            .source(Box::new(say_source()))
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(["explode", "say survived", "exit"]))
            .build()
            .unwrap();
        engine.run_interactive().await.unwrap();
        let captured = engine.output().captured();
        assert!(captured.iter().any(|l| l.contains("boom")));
        assert!(captured.contains(&"survived".to_string()));
    }

    #[tokio::test]
    async fn script_expansion_flows_through_the_queue() {
        let script = Script::new(
            HandlerInfo::new("greet", "greeting macro"),
            vec![r#"say [0] name=['n':"anon"]"#.to_string()],
        )
        .unwrap();
        let scripts = crate::core::sources::ScriptSource::new().script(script).unwrap();
        let mut engine = Engine::builder()
            .source(Box::new(say_source()))
            .source(Box::new(scripts))
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        engine.run_headless(["greet alice"]).await.unwrap();
        assert_eq!(engine.output().captured(), ["alice name=anon"]);
    }

    #[tokio::test]
    async fn environment_change_fires_event_and_clears_cache() {
        let event = Script::new(
            HandlerInfo::new("on env changed", "event"),
            vec!["say switched".to_string()],
        )
        .unwrap();
        let mut engine = Engine::builder()
            .source(Box::new(say_source()))
            .environments(EnvironmentCollection::new(["dev", "prod"]).unwrap())
            .on_environment_changed(event)
            .clear_cache_on_environment_change(true)
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        engine.run_headless(["env dev"]).await.unwrap();
        assert_eq!(engine.environments().current_name().unwrap(), "dev");
        assert!(engine
            .output()
            .captured()
            .contains(&"switched".to_string()));
    }

    #[tokio::test]
    async fn invalid_environment_is_fatal() {
        let mut engine = Engine::builder()
            .environments(EnvironmentCollection::new(["dev", "prod"]).unwrap())
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        let err = engine.run_headless(["env staging"]).await.unwrap_err();
        assert!(matches!(
            err,
            ShellError::Environment(EnvironmentError::Invalid(ref name)) if name == "staging"
        ));
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop_between_commands() {
        let token = CancellationToken::default();
        token.store(true, Ordering::SeqCst);
        let mut engine = Engine::builder()
            .source(Box::new(say_source()))
            .cancellation(token)
            .output(OutputSink::memory())
            .input(ConsoleInput::preset(Vec::<String>::new()))
            .build()
            .unwrap();
        let err = engine.run_headless(["say never"]).await.unwrap_err();
        assert!(matches!(err, ShellError::Interrupted));
        assert!(engine.output().captured().is_empty());
    }

    #[test]
    fn zero_loop_limit_is_a_build_error() {
        let result = Engine::builder().loop_limit(0).build();
        assert!(matches!(result, Err(ShellError::Build(_))));
    }
}

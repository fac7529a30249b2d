// src/core/sources.rs

//! # Handler Sources
//!
//! A [`HandlerSource`] maps a resolved verb to an executable handler, or
//! reports that it has none. Sources are combined into a [`SourceChain`]:
//! an ordered, first-match-wins cascade consulted after the verb-alias table
//! has renamed the command. The first-party sources are delegates,
//! pre-built instances and scripts, plus the [`ExternalResolver`] seam for
//! container-managed construction.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::CancellationToken;
use crate::core::engine::EngineState;
use crate::core::environment::EnvironmentCollection;
use crate::core::grammars::Grammar;
use crate::core::output::OutputSink;
use crate::core::script::Script;
use crate::core::trie::VerbTrie;
use crate::errors::ShellError;
use crate::models::{Arguments, Command, HandlerInfo, QueuedCommand, Verb};
use crate::system::console::ConsoleInput;

// --- HANDLER EXECUTION CONTRACT ---

/// Everything a handler may touch, passed explicitly. There is no runtime
/// type-matching: the context is one statically-typed structure.
pub struct HandlerContext<'a> {
    /// The verb this handler was resolved under (after alias rewriting).
    pub verb: Verb,
    /// The command's arguments; verb words are already consumed.
    pub args: Arguments,
    pub output: &'a OutputSink,
    pub input: &'a ConsoleInput,
    pub state: &'a mut EngineState,
    pub environments: &'a mut EnvironmentCollection,
    /// Read view of the full chain, for listings (`help`).
    pub registry: &'a SourceChain,
    pub cancellation: &'a CancellationToken,
}

impl HandlerContext<'_> {
    /// Enqueues a raw command line to run after the current command. Lines
    /// enqueued here count against the safety valve.
    pub fn enqueue(&mut self, line: impl Into<String>) {
        self.state.queue.push(QueuedCommand::scripted_raw(line));
    }
}

/// The unit of behavior executed for a resolved verb.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()>;
}

/// The future type async delegates return.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

struct SyncDelegate<F>(F);

#[async_trait]
impl<F> Handler for SyncDelegate<F>
where
    F: Fn(&mut HandlerContext<'_>) -> Result<()> + Send + Sync,
{
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        (self.0)(ctx)
    }
}

struct AsyncDelegate<F>(F);

#[async_trait]
impl<F> Handler for AsyncDelegate<F>
where
    F: for<'a, 'b> Fn(&'a mut HandlerContext<'b>) -> HandlerFuture<'a> + Send + Sync,
{
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        (self.0)(ctx).await
    }
}

// --- RESOLUTION SEAM ---

/// The long-lived collaborators offered to sources during resolution.
/// Container adapters built on [`ExternalResolver`] receive these plus the
/// per-call command.
pub struct ResolverSeam<'a> {
    pub grammar: &'a Grammar,
    pub output: &'a OutputSink,
    pub environments: &'a EnvironmentCollection,
    pub state: &'a EngineState,
    pub registry: &'a SourceChain,
}

/// Resolves a command to an executable handler, lists its registrations, and
/// looks one up by exact verb.
pub trait HandlerSource: Send + Sync {
    fn resolve(
        &self,
        command: &Command,
        seam: &ResolverSeam<'_>,
    ) -> Result<Option<Arc<dyn Handler>>, ShellError>;

    fn entries(&self) -> Vec<HandlerInfo>;

    fn find(&self, verb: &Verb) -> Option<HandlerInfo>;
}

// --- FIRST-PARTY REGISTRY ---

/// The explicit verb registry shared by the first-party sources. Duplicate
/// registration inside one source is a build-time failure.
#[derive(Default)]
struct Registry {
    entries: Vec<(Verb, HandlerInfo, Arc<dyn Handler>)>,
}

impl Registry {
    fn add(&mut self, info: HandlerInfo, handler: Arc<dyn Handler>) -> Result<(), ShellError> {
        let verb = Verb::parse(&info.verb)?;
        if self.entries.iter().any(|(v, ..)| *v == verb) {
            return Err(ShellError::Build(format!(
                "verb '{verb}' is already registered in this source"
            )));
        }
        self.entries.push((verb, info, handler));
        Ok(())
    }

    fn resolve(&self, verb: &Verb) -> Option<Arc<dyn Handler>> {
        self.entries
            .iter()
            .find(|(v, ..)| v == verb)
            .map(|(_, _, handler)| Arc::clone(handler))
    }

    fn find(&self, verb: &Verb) -> Option<HandlerInfo> {
        self.entries
            .iter()
            .find(|(v, ..)| v == verb)
            .map(|(_, info, _)| info.clone())
    }

    fn entries(&self) -> Vec<HandlerInfo> {
        self.entries.iter().map(|(_, info, _)| info.clone()).collect()
    }
}

// --- DELEGATE SOURCE ---

/// Verbs bound directly to closures, sync or async.
#[derive(Default)]
pub struct DelegateSource {
    registry: Registry,
}

impl DelegateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delegate<F>(mut self, info: HandlerInfo, f: F) -> Result<Self, ShellError>
    where
        F: Fn(&mut HandlerContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.registry.add(info, Arc::new(SyncDelegate(f)))?;
        Ok(self)
    }

    pub fn delegate_async<F>(mut self, info: HandlerInfo, f: F) -> Result<Self, ShellError>
    where
        F: for<'a, 'b> Fn(&'a mut HandlerContext<'b>) -> HandlerFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.registry.add(info, Arc::new(AsyncDelegate(f)))?;
        Ok(self)
    }
}

impl HandlerSource for DelegateSource {
    fn resolve(
        &self,
        command: &Command,
        _seam: &ResolverSeam<'_>,
    ) -> Result<Option<Arc<dyn Handler>>, ShellError> {
        Ok(self.registry.resolve(command.verb()))
    }

    fn entries(&self) -> Vec<HandlerInfo> {
        self.registry.entries()
    }

    fn find(&self, verb: &Verb) -> Option<HandlerInfo> {
        self.registry.find(verb)
    }
}

// --- INSTANCE SOURCE ---

/// Verbs bound to pre-built handler objects.
#[derive(Default)]
pub struct InstanceSource {
    registry: Registry,
}

impl InstanceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(
        mut self,
        info: HandlerInfo,
        handler: Arc<dyn Handler>,
    ) -> Result<Self, ShellError> {
        self.registry.add(info, handler)?;
        Ok(self)
    }
}

impl HandlerSource for InstanceSource {
    fn resolve(
        &self,
        command: &Command,
        _seam: &ResolverSeam<'_>,
    ) -> Result<Option<Arc<dyn Handler>>, ShellError> {
        Ok(self.registry.resolve(command.verb()))
    }

    fn entries(&self) -> Vec<HandlerInfo> {
        self.registry.entries()
    }

    fn find(&self, verb: &Verb) -> Option<HandlerInfo> {
        self.registry.find(verb)
    }
}

// --- SCRIPT SOURCE ---

/// Scripts registered as handlers: resolving the script's verb yields a
/// handler that expands the template lines against the caller's arguments
/// and enqueues one derived command per line.
#[derive(Default)]
pub struct ScriptSource {
    registry: Registry,
}

struct ScriptHandler {
    script: Arc<Script>,
}

#[async_trait]
impl Handler for ScriptHandler {
    async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let derived = self.script.expand(&mut ctx.args)?;
        log::debug!(
            "script '{}' expanded into {} command(s)",
            self.script.verb(),
            derived.len()
        );
        for args in derived {
            ctx.state.queue.push(QueuedCommand::scripted(args));
        }
        Ok(())
    }
}

impl ScriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, script: Script) -> Result<Self, ShellError> {
        let info = script.info().clone();
        self.registry.add(
            info,
            Arc::new(ScriptHandler {
                script: Arc::new(script),
            }),
        )?;
        Ok(self)
    }
}

impl HandlerSource for ScriptSource {
    fn resolve(
        &self,
        command: &Command,
        _seam: &ResolverSeam<'_>,
    ) -> Result<Option<Arc<dyn Handler>>, ShellError> {
        Ok(self.registry.resolve(command.verb()))
    }

    fn entries(&self) -> Vec<HandlerInfo> {
        self.registry.entries()
    }

    fn find(&self, verb: &Verb) -> Option<HandlerInfo> {
        self.registry.find(verb)
    }
}

// --- EXTERNAL RESOLVER SEAM ---

/// The container-integration seam. The host constructs its resolver with
/// whatever long-lived collaborators it needs; per call it receives the seam
/// and the command (with its arguments) and returns a constructed handler or
/// "not found". Everything behind this trait lives outside the core.
pub trait ExternalResolver: Send + Sync {
    fn construct(
        &self,
        command: &Command,
        seam: &ResolverSeam<'_>,
    ) -> Result<Option<Arc<dyn Handler>>, ShellError>;

    fn entries(&self) -> Vec<HandlerInfo> {
        Vec::new()
    }

    fn find(&self, _verb: &Verb) -> Option<HandlerInfo> {
        None
    }
}

/// Adapter exposing an [`ExternalResolver`] as a chain source.
pub struct ExternalSource {
    resolver: Arc<dyn ExternalResolver>,
}

impl ExternalSource {
    pub fn new(resolver: Arc<dyn ExternalResolver>) -> Self {
        Self { resolver }
    }
}

impl HandlerSource for ExternalSource {
    fn resolve(
        &self,
        command: &Command,
        seam: &ResolverSeam<'_>,
    ) -> Result<Option<Arc<dyn Handler>>, ShellError> {
        self.resolver.construct(command, seam)
    }

    fn entries(&self) -> Vec<HandlerInfo> {
        self.resolver.entries()
    }

    fn find(&self, verb: &Verb) -> Option<HandlerInfo> {
        self.resolver.find(verb)
    }
}

// --- SOURCE CHAIN ---

/// Ordered sources plus the alias table and the verb trie built over every
/// registration. Resolution order: trie match on leading positionals, alias
/// rename, then each source in registration order until one matches.
pub struct SourceChain {
    sources: Vec<Box<dyn HandlerSource>>,
    aliases: HashMap<String, String>,
    trie: VerbTrie<()>,
}

#[derive(Default)]
pub struct SourceChainBuilder {
    sources: Vec<Box<dyn HandlerSource>>,
    aliases: Vec<(String, String)>,
}

impl SourceChainBuilder {
    pub fn source(mut self, source: Box<dyn HandlerSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Registers `from` as a pure synonym: commands resolved under it are
    /// renamed to `to` before the chain is consulted.
    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.push((from.into(), to.into()));
        self
    }

    pub fn build(self) -> Result<SourceChain, ShellError> {
        let mut trie = VerbTrie::new();
        for source in &self.sources {
            for info in source.entries() {
                let verb = Verb::parse(&info.verb)?;
                trie.insert(verb.words(), ());
            }
        }

        let mut aliases = HashMap::new();
        for (from, to) in self.aliases {
            let from_verb = Verb::parse(&from)?;
            // The target must parse now; a dangling alias is still allowed to
            // fail resolution later (the target source may be external).
            let _ = Verb::parse(&to)?;
            if trie.contains_exact(from_verb.words()) {
                return Err(ShellError::Build(format!(
                    "alias '{from}' collides with a registered verb"
                )));
            }
            trie.insert(from_verb.words(), ());
            if aliases.insert(from_verb.text(), to.clone()).is_some() {
                return Err(ShellError::Build(format!("alias '{from}' declared twice")));
            }
        }

        Ok(SourceChain {
            sources: self.sources,
            aliases,
            trie,
        })
    }
}

impl SourceChain {
    pub fn builder() -> SourceChainBuilder {
        SourceChainBuilder::default()
    }

    /// Resolves the longest registered verb from the leading unconsumed
    /// positionals. Returns the verb and how many words it consumed; the
    /// caller marks exactly that many positionals used.
    pub fn resolve_verb(&self, args: &Arguments) -> Result<(Verb, usize), ShellError> {
        let words: Vec<String> = args
            .unconsumed_positional_values()
            .iter()
            .map(ToString::to_string)
            .collect();
        match self.trie.get(&words) {
            Some((_, consumed)) => Ok((Verb::from_words(&words[..consumed])?, consumed)),
            None => Err(ShellError::VerbNotFound {
                verb: if words.is_empty() {
                    None
                } else {
                    Some(words.join(" "))
                },
            }),
        }
    }

    /// Renames the command if its verb is an alias.
    pub fn apply_alias(&self, command: &mut Command) -> Result<(), ShellError> {
        if let Some(target) = self.aliases.get(&command.verb().text()) {
            log::debug!("alias '{}' -> '{}'", command.verb(), target);
            command.rename(Verb::parse(target)?);
        }
        Ok(())
    }

    /// First-match-wins resolution across the sources.
    pub fn resolve(
        &self,
        command: &Command,
        seam: &ResolverSeam<'_>,
    ) -> Result<Option<Arc<dyn Handler>>, ShellError> {
        for source in &self.sources {
            if let Some(handler) = source.resolve(command, seam)? {
                return Ok(Some(handler));
            }
        }
        Ok(None)
    }

    /// Every registration across every source, in chain order.
    pub fn entries(&self) -> Vec<HandlerInfo> {
        self.sources.iter().flat_map(|s| s.entries()).collect()
    }

    /// Registration metadata for an exact verb, following aliases.
    pub fn find(&self, verb: &Verb) -> Option<HandlerInfo> {
        let target = match self.aliases.get(&verb.text()) {
            Some(to) => Verb::parse(to).ok()?,
            None => verb.clone(),
        };
        self.sources.iter().find_map(|s| s.find(&target))
    }

    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunMode;

    fn seamless<'a>(
        grammar: &'a Grammar,
        output: &'a OutputSink,
        environments: &'a EnvironmentCollection,
        state: &'a EngineState,
        chain: &'a SourceChain,
    ) -> ResolverSeam<'a> {
        ResolverSeam {
            grammar,
            output,
            environments,
            state,
            registry: chain,
        }
    }

    fn noop(info: HandlerInfo) -> (HandlerInfo, Arc<dyn Handler>) {
        struct Noop;
        #[async_trait]
        impl Handler for Noop {
            async fn execute(&self, _ctx: &mut HandlerContext<'_>) -> Result<()> {
                Ok(())
            }
        }
        (info, Arc::new(Noop))
    }

    #[test]
    fn duplicate_verb_in_one_source_is_a_build_error() {
        let (info_a, handler_a) = noop(HandlerInfo::new("run", "first"));
        let (info_b, handler_b) = noop(HandlerInfo::new("RUN", "second"));
        let result = InstanceSource::new()
            .instance(info_a, handler_a)
            .unwrap()
            .instance(info_b, handler_b);
        assert!(matches!(result, Err(ShellError::Build(_))));
    }

    #[test]
    fn alias_collision_with_registered_verb_is_a_build_error() {
        let (info, handler) = noop(HandlerInfo::new("status", "status"));
        let source = InstanceSource::new().instance(info, handler).unwrap();
        let result = SourceChain::builder()
            .source(Box::new(source))
            .alias("status", "other")
            .build();
        assert!(matches!(result, Err(ShellError::Build(_))));
    }

    #[test]
    fn verb_resolution_walks_the_trie_and_counts_consumption() {
        let (a, ha) = noop(HandlerInfo::new("env", "env"));
        let (b, hb) = noop(HandlerInfo::new("env clear", "clear"));
        let source = InstanceSource::new()
            .instance(a, ha)
            .unwrap()
            .instance(b, hb)
            .unwrap();
        let chain = SourceChain::builder().source(Box::new(source)).build().unwrap();

        let args = Grammar::Simplified.parse("env clear now").unwrap();
        let (verb, consumed) = chain.resolve_verb(&args).unwrap();
        assert_eq!(verb.text(), "env clear");
        assert_eq!(consumed, 2);

        let args = Grammar::Simplified.parse("env prod").unwrap();
        let (verb, consumed) = chain.resolve_verb(&args).unwrap();
        assert_eq!(verb.text(), "env");
        assert_eq!(consumed, 1);

        let args = Grammar::Simplified.parse("bogus").unwrap();
        let err = chain.resolve_verb(&args).unwrap_err();
        assert!(matches!(
            err,
            ShellError::VerbNotFound { verb: Some(ref v) } if v == "bogus"
        ));
    }

    #[test]
    fn alias_renames_before_sources_are_consulted() {
        let (info, handler) = noop(HandlerInfo::new("environment select", "select"));
        let source = InstanceSource::new().instance(info, handler).unwrap();
        let chain = SourceChain::builder()
            .source(Box::new(source))
            .alias("es", "environment select")
            .build()
            .unwrap();

        let args = Grammar::Simplified.parse("es prod").unwrap();
        let (verb, consumed) = chain.resolve_verb(&args).unwrap();
        assert_eq!(consumed, 1);

        let mut command = Command::new(verb, args);
        chain.apply_alias(&mut command).unwrap();
        assert_eq!(command.verb().text(), "environment select");

        let grammar = Grammar::Simplified;
        let output = OutputSink::memory();
        let environments = EnvironmentCollection::default_single();
        let state = EngineState::new(RunMode::Headless);
        let seam = seamless(&grammar, &output, &environments, &state, &chain);
        assert!(chain.resolve(&command, &seam).unwrap().is_some());
    }

    #[test]
    fn chain_resolution_is_first_match_wins() {
        struct Tagged(&'static str);
        #[async_trait]
        impl Handler for Tagged {
            async fn execute(&self, ctx: &mut HandlerContext<'_>) -> Result<()> {
                ctx.output.line(self.0);
                Ok(())
            }
        }

        let first = InstanceSource::new()
            .instance(HandlerInfo::new("go", "first"), Arc::new(Tagged("first")))
            .unwrap();
        let second = InstanceSource::new()
            .instance(HandlerInfo::new("go", "second"), Arc::new(Tagged("second")))
            .unwrap();
        let chain = SourceChain::builder()
            .source(Box::new(first))
            .source(Box::new(second))
            .build()
            .unwrap();

        assert_eq!(chain.find(&Verb::parse("go").unwrap()).unwrap().description, "first");
        assert_eq!(chain.entries().len(), 2);
    }

    #[tokio::test]
    async fn sync_and_async_delegates_both_execute() {
        fn pong_async<'a>(ctx: &'a mut HandlerContext<'_>) -> HandlerFuture<'a> {
            Box::pin(async move {
                ctx.output.line("pong async");
                Ok(())
            })
        }

        let source = DelegateSource::new()
            .delegate(HandlerInfo::new("ping", "sync"), |ctx| {
                ctx.output.line("pong");
                Ok(())
            })
            .unwrap()
            .delegate_async(HandlerInfo::new("ping async", "async"), pong_async)
            .unwrap();
        let chain = SourceChain::builder().source(Box::new(source)).build().unwrap();

        let grammar = Grammar::Simplified;
        let output = OutputSink::memory();
        let token: CancellationToken = CancellationToken::default();
        let input = ConsoleInput::preset(Vec::<String>::new());

        for (line, expect) in [("ping", "pong"), ("ping async", "pong async")] {
            let mut environments = EnvironmentCollection::default_single();
            let mut state = EngineState::new(RunMode::Headless);
            let mut args = Grammar::Simplified.parse(line).unwrap();
            let (verb, consumed) = chain.resolve_verb(&args).unwrap();
            args.consume_leading_positionals(consumed);
            let command = Command::new(verb, args);
            let handler = {
                let seam = seamless(&grammar, &output, &environments, &state, &chain);
                chain.resolve(&command, &seam).unwrap().unwrap()
            };
            let mut ctx = HandlerContext {
                verb: command.verb().clone(),
                args: command.args.clone(),
                output: &output,
                input: &input,
                state: &mut state,
                environments: &mut environments,
                registry: &chain,
                cancellation: &token,
            };
            handler.execute(&mut ctx).await.unwrap();
            assert!(output.captured().contains(&expect.to_string()));
        }
    }
}

// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::constants::DEFAULT_GROUP;
use crate::errors::ShellError;

// --- ARGUMENT MODEL ---

/// A single parsed argument with its consumption state.
///
/// Consumption is interior state of the instance held by an [`Arguments`]
/// collection: marking an argument as used must be visible to every later
/// accessor, not to a private copy.
#[derive(Debug, Clone)]
pub enum Argument {
    Positional {
        value: String,
        consumed: bool,
    },
    Named {
        name: String,
        value: String,
        consumed: bool,
    },
    Flag {
        name: String,
        consumed: bool,
    },
    /// The absence of an argument, carrying the reason it is absent.
    Missing {
        reason: String,
    },
}

impl Argument {
    pub fn positional(value: impl Into<String>) -> Self {
        Self::Positional {
            value: value.into(),
            consumed: false,
        }
    }

    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            value: value.into(),
            consumed: false,
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self::Flag {
            name: name.into(),
            consumed: false,
        }
    }

    pub fn missing(reason: impl Into<String>) -> Self {
        Self::Missing {
            reason: reason.into(),
        }
    }

    /// True for any variant except `Missing`. An empty-string value is
    /// present; callers must not conflate it with absence.
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Missing { .. })
    }

    pub fn is_consumed(&self) -> bool {
        match self {
            Self::Positional { consumed, .. }
            | Self::Named { consumed, .. }
            | Self::Flag { consumed, .. } => *consumed,
            Self::Missing { .. } => false,
        }
    }

    pub fn consume(&mut self) {
        match self {
            Self::Positional { consumed, .. }
            | Self::Named { consumed, .. }
            | Self::Flag { consumed, .. } => *consumed = true,
            Self::Missing { .. } => {}
        }
    }

    /// The carried value, if this kind of argument has one.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Positional { value, .. } | Self::Named { value, .. } => Some(value),
            Self::Flag { .. } | Self::Missing { .. } => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } | Self::Flag { name, .. } => Some(name),
            Self::Positional { .. } | Self::Missing { .. } => None,
        }
    }
}

/// Equality ignores the consumption flag; `Missing` never equals a present
/// argument.
impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Positional { value: a, .. }, Self::Positional { value: b, .. }) => a == b,
            (
                Self::Named {
                    name: an, value: av, ..
                },
                Self::Named {
                    name: bn, value: bv, ..
                },
            ) => an == bn && av == bv,
            (Self::Flag { name: a, .. }, Self::Flag { name: b, .. }) => a == b,
            (Self::Missing { .. }, Self::Missing { .. }) => true,
            _ => false,
        }
    }
}

impl Eq for Argument {}

// --- ARGUMENTS COLLECTION ---

/// An ordered sequence of arguments with shared consumption state.
///
/// Positional iteration order is always the parse order; a shift or an
/// indexed get never reorders still-unconsumed earlier positionals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    items: Vec<Argument>,
    /// When set (by the Windows-CMD grammar), exhausted positional reads
    /// yield an empty-string positional instead of `Missing`.
    missing_as_empty: bool,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Argument>) -> Self {
        Self {
            items,
            missing_as_empty: false,
        }
    }

    /// Switches the exhaustion sentinel from `Missing` to an empty-string
    /// positional.
    pub fn with_empty_sentinel(mut self) -> Self {
        self.missing_as_empty = true;
        self
    }

    pub fn push(&mut self, arg: Argument) {
        self.items.push(arg);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Argument] {
        &self.items
    }

    fn absent(&self, reason: String) -> Argument {
        if self.missing_as_empty {
            Argument::Positional {
                value: String::new(),
                consumed: true,
            }
        } else {
            Argument::missing(reason)
        }
    }

    /// Consumes and returns the next unconsumed positional in parse order.
    /// Exhaustion is idempotent: every further shift reports absence again.
    pub fn shift(&mut self) -> Argument {
        for arg in &mut self.items {
            if matches!(arg, Argument::Positional { .. }) && !arg.is_consumed() {
                arg.consume();
                return arg.clone();
            }
        }
        self.absent("no positional arguments remain".to_string())
    }

    /// Consumes the positional at parse-order index `index`. Already-consumed
    /// entries report absence rather than silently re-reading.
    pub fn positional(&mut self, index: usize) -> Argument {
        let mut seen = 0usize;
        let mut found = None;
        for (i, arg) in self.items.iter().enumerate() {
            if matches!(arg, Argument::Positional { .. }) {
                if seen == index {
                    found = Some(i);
                    break;
                }
                seen += 1;
            }
        }
        match found {
            Some(i) => {
                if self.items[i].is_consumed() {
                    self.absent(format!("positional {index} was already consumed"))
                } else {
                    self.items[i].consume();
                    self.items[i].clone()
                }
            }
            None => self.absent(format!("no positional argument at index {index}")),
        }
    }

    /// Consumes the first unconsumed named argument called `name`.
    /// Duplicates are supported; each lookup takes the next one in order.
    pub fn named(&mut self, name: &str) -> Argument {
        for arg in &mut self.items {
            if let Argument::Named { name: n, .. } = arg
                && n == name
                && !arg.is_consumed()
            {
                arg.consume();
                return arg.clone();
            }
        }
        Argument::missing(format!("no named argument '{name}'"))
    }

    /// Consumes the first unconsumed flag called `name`.
    pub fn flag(&mut self, name: &str) -> Argument {
        for arg in &mut self.items {
            if let Argument::Flag { name: n, .. } = arg
                && n == name
                && !arg.is_consumed()
            {
                arg.consume();
                return arg.clone();
            }
        }
        Argument::missing(format!("no flag '{name}'"))
    }

    /// Existence query, independent of consumption state. Distinguishes a
    /// named argument holding `""` from one that is absent.
    pub fn has_named(&self, name: &str) -> bool {
        self.items
            .iter()
            .any(|a| matches!(a, Argument::Named { name: n, .. } if n == name))
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.items
            .iter()
            .any(|a| matches!(a, Argument::Flag { name: n, .. } if n == name))
    }

    pub fn positionals(&self) -> Vec<&Argument> {
        self.items
            .iter()
            .filter(|a| matches!(a, Argument::Positional { .. }))
            .collect()
    }

    pub fn named_args(&self) -> Vec<&Argument> {
        self.items
            .iter()
            .filter(|a| matches!(a, Argument::Named { .. }))
            .collect()
    }

    pub fn flags(&self) -> Vec<&Argument> {
        self.items
            .iter()
            .filter(|a| matches!(a, Argument::Flag { .. }))
            .collect()
    }

    /// Values of every still-unconsumed positional, in parse order. The run
    /// loop feeds these to the verb trie.
    pub fn unconsumed_positional_values(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|a| matches!(a, Argument::Positional { .. }) && !a.is_consumed())
            .filter_map(Argument::value)
            .collect()
    }

    /// Marks the first `count` unconsumed positionals as consumed (used after
    /// verb resolution to claim the verb words).
    pub fn consume_leading_positionals(&mut self, count: usize) {
        let mut left = count;
        for arg in &mut self.items {
            if left == 0 {
                break;
            }
            if matches!(arg, Argument::Positional { .. }) && !arg.is_consumed() {
                arg.consume();
                left -= 1;
            }
        }
    }

    /// Consumes and returns every remaining positional, preserving order.
    pub fn take_positionals(&mut self) -> Vec<Argument> {
        self.take_kind(|a| matches!(a, Argument::Positional { .. }))
    }

    /// Consumes and returns every remaining named argument, preserving order.
    pub fn take_named(&mut self) -> Vec<Argument> {
        self.take_kind(|a| matches!(a, Argument::Named { .. }))
    }

    /// Consumes and returns every remaining flag, preserving order.
    pub fn take_flags(&mut self) -> Vec<Argument> {
        self.take_kind(|a| matches!(a, Argument::Flag { .. }))
    }

    fn take_kind(&mut self, matcher: impl Fn(&Argument) -> bool) -> Vec<Argument> {
        let mut taken = Vec::new();
        for arg in &mut self.items {
            if matcher(arg) && !arg.is_consumed() {
                arg.consume();
                taken.push(arg.clone());
            }
        }
        taken
    }

    pub fn any_unconsumed(&self) -> bool {
        self.items
            .iter()
            .any(|a| a.is_present() && !a.is_consumed())
    }
}

// --- VERB ---

/// A non-empty, lower-cased sequence of words identifying a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Verb {
    words: Vec<String>,
}

impl Verb {
    /// Splits `text` on whitespace. Fails on input with no words.
    pub fn parse(text: &str) -> Result<Self, ShellError> {
        Self::from_words(text.split_whitespace())
    }

    /// Builds a verb from pre-split words, discarding empty entries. Fails if
    /// nothing remains.
    pub fn from_words<I, S>(words: I) -> Result<Self, ShellError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(ShellError::Build(
                "a verb requires at least one non-empty word".to_string(),
            ));
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

// --- COMMAND ---

/// A resolved verb bound to the arguments it was parsed with. Immutable
/// except for renaming during alias resolution.
#[derive(Debug, Clone)]
pub struct Command {
    verb: Verb,
    pub args: Arguments,
}

impl Command {
    pub fn new(verb: Verb, args: Arguments) -> Self {
        Self { verb, args }
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// Replaces the verb. Used exclusively by alias rewriting before the
    /// command is offered to the handler-source chain.
    pub fn rename(&mut self, verb: Verb) {
        self.verb = verb;
    }
}

// --- REGISTRATION METADATA ---

/// Plain-data registration metadata for one verb: what `help` shows and how
/// listings are grouped. Declared explicitly at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerInfo {
    pub verb: String,
    pub description: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default = "HandlerInfo::default_group")]
    pub group: String,
    #[serde(default)]
    pub hidden: bool,
}

impl HandlerInfo {
    pub fn new(verb: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            description: description.into(),
            usage: String::new(),
            group: DEFAULT_GROUP.to_string(),
            hidden: false,
        }
    }

    fn default_group() -> String {
        DEFAULT_GROUP.to_string()
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

// --- RUN-LOOP MODELS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    Headless,
}

/// A value in the engine's metadata cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Counter(usize),
    Flag(bool),
    Text(String),
}

/// A pending command: either raw text still to be parsed, or an argument
/// sequence produced by script expansion.
#[derive(Debug, Clone)]
pub enum QueuedPayload {
    Raw(String),
    Parsed(Arguments),
}

#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub payload: QueuedPayload,
    /// True only for commands typed at the prompt or given on the original
    /// command line. Scripted commands trip the safety valve; these reset it.
    pub user_sourced: bool,
}

impl QueuedCommand {
    pub fn user(line: impl Into<String>) -> Self {
        Self {
            payload: QueuedPayload::Raw(line.into()),
            user_sourced: true,
        }
    }

    pub fn scripted_raw(line: impl Into<String>) -> Self {
        Self {
            payload: QueuedPayload::Raw(line.into()),
            user_sourced: false,
        }
    }

    pub fn scripted(args: Arguments) -> Self {
        Self {
            payload: QueuedPayload::Parsed(args),
            user_sourced: false,
        }
    }
}

/// FIFO queue of pending commands, owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    items: VecDeque<QueuedCommand>,
}

impl CommandQueue {
    pub fn push(&mut self, command: QueuedCommand) {
        self.items.push_back(command);
    }

    pub fn pop(&mut self) -> Option<QueuedCommand> {
        self.items.pop_front()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// MARK: --- UNIT TESTS ---

// src/errors.rs

use thiserror::Error;

/// Errors raised while turning a raw line into arguments.
///
/// An empty line is its own variant: "nothing was typed" must stay
/// distinguishable from "a command with zero arguments".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Cannot parse an empty command line.")]
    EmptyInput,
    #[error("Unterminated {0} quote in input.")]
    UnterminatedQuote(char),
    #[error("Malformed input: {0}")]
    Malformed(String),
}

/// Environment-selection failures. `Invalid` and the headless variant are
/// escalated to fatal by the run loop; `NotChanged` and `NoneSet` are left to
/// the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("No environment was specified and none could be selected.")]
    NoneSpecified,
    #[error("No environment was specified and more than one is available; headless mode cannot prompt.")]
    NoneSpecifiedHeadless,
    #[error("'{0}' is not a valid environment.")]
    Invalid(String),
    #[error("No environment has been selected yet.")]
    NoneSet,
    #[error("Environment was not changed; it is already current.")]
    NotChanged,
}

/// The crate-wide error taxonomy. Handlers return `anyhow::Result`; the run
/// loop classifies failures by downcasting to this type.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("No handler found for verb '{}'.", .verb.as_deref().unwrap_or("<no verb provided>"))]
    VerbNotFound { verb: Option<String> },

    #[error("Required argument {token} was not provided and has no default.")]
    MissingRequiredArgument { token: String },

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Conflicting or invalid setup, detected at construction time.
    #[error("Invalid configuration: {0}")]
    Build(String),

    /// A domain error raised inside a handler's own body.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// The safety valve tripped twice without recovery. Always fatal.
    #[error("Loop limit of {limit} consecutive scripted commands exceeded.")]
    LoopLimitExceeded { limit: usize },

    #[error("Operation was interrupted.")]
    Interrupted,
}

impl ShellError {
    /// Whether the run loop must stop instead of recovering.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::LoopLimitExceeded { .. } | Self::Interrupted => true,
            Self::Environment(e) => matches!(
                e,
                EnvironmentError::Invalid(_) | EnvironmentError::NoneSpecifiedHeadless
            ),
            _ => false,
        }
    }
}

// MARK: --- UNIT TESTS ---

// src/constants.rs

/// Default number of consecutive inputless commands the safety valve allows
/// before it trips.
pub const DEFAULT_LOOP_LIMIT: usize = 16;

/// The prompt shown by the interactive run loop.
pub const PROMPT: &str = ">";

/// Question asked when the safety valve trips in interactive mode.
pub const VALVE_PROMPT: &str = "Command limit reached. Continue?";

/// Metadata key for the consecutive-inputless-command counter.
pub const META_VALVE_COUNTER: &str = "valve.counter";

/// Metadata key set after the headless safety valve has tripped once.
pub const META_VALVE_TRIPPED: &str = "valve.tripped";

/// Metadata key set by the `exit` verb to request loop termination.
pub const META_STOP_REQUESTED: &str = "loop.stop";

/// Name used by the degenerate single-environment collection.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Group assigned to registrations that do not declare one.
pub const DEFAULT_GROUP: &str = "general";

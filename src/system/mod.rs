//! # System Interaction Layer
//!
//! The boundary between the core run loop and the terminal it talks to.
//!
//! - **`console`**: prompt, confirmation and selection input, with a
//!   scriptable preset variant so interactive behavior stays testable.

pub mod console;

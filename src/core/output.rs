// src/core/output.rs

use colored::{Color, Colorize};
use std::sync::{Arc, Mutex};

/// An explicit output value threaded through the call chain.
///
/// There is no process-wide console state: a handler receives a sink and
/// writes through it. Styling is a scoped transformation: `with_color`
/// returns a possibly-new sink value and leaves the original untouched.
#[derive(Debug, Clone)]
pub struct OutputSink {
    target: SinkTarget,
    color: Option<Color>,
}

#[derive(Debug, Clone)]
enum SinkTarget {
    Stdout,
    Stderr,
    Memory(Arc<Mutex<Vec<String>>>),
}

impl OutputSink {
    pub fn stdout() -> Self {
        Self {
            target: SinkTarget::Stdout,
            color: None,
        }
    }

    pub fn stderr() -> Self {
        Self {
            target: SinkTarget::Stderr,
            color: None,
        }
    }

    /// A sink that collects lines in memory. Used by tests and embedding
    /// hosts that capture output.
    pub fn memory() -> Self {
        Self {
            target: SinkTarget::Memory(Arc::new(Mutex::new(Vec::new()))),
            color: None,
        }
    }

    /// A new sink writing to the same target with the given color applied.
    pub fn with_color(&self, color: Color) -> Self {
        Self {
            target: self.target.clone(),
            color: Some(color),
        }
    }

    /// A new sink writing to the same target with styling removed.
    pub fn plain(&self) -> Self {
        Self {
            target: self.target.clone(),
            color: None,
        }
    }

    pub fn line(&self, text: &str) {
        match &self.target {
            SinkTarget::Stdout => match self.color {
                Some(c) => println!("{}", text.color(c)),
                None => println!("{text}"),
            },
            SinkTarget::Stderr => match self.color {
                Some(c) => eprintln!("{}", text.color(c)),
                None => eprintln!("{text}"),
            },
            // Memory capture stays unstyled so tests can match on content.
            SinkTarget::Memory(buffer) => {
                if let Ok(mut lines) = buffer.lock() {
                    lines.push(text.to_string());
                }
            }
        }
    }

    /// Reports an error through the sink, styled red on a terminal target.
    pub fn error(&self, text: &str) {
        match &self.target {
            SinkTarget::Memory(_) => self.line(&format!("Error: {text}")),
            _ => self.with_color(Color::Red).line(&format!("Error: {text}")),
        }
    }

    /// Lines collected by a memory sink. Empty for terminal targets.
    pub fn captured(&self) -> Vec<String> {
        match &self.target {
            SinkTarget::Memory(buffer) => buffer.lock().map(|l| l.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_captures_lines_in_order() {
        let sink = OutputSink::memory();
        sink.line("one");
        sink.error("two");
        assert_eq!(sink.captured(), ["one", "Error: two"]);
    }

    #[test]
    fn color_scoping_returns_a_new_sink_sharing_the_target() {
        let sink = OutputSink::memory();
        let green = sink.with_color(Color::Green);
        green.line("styled");
        // The transformed sink writes to the same buffer; the original value
        // is unchanged and still unstyled.
        assert_eq!(sink.captured(), ["styled"]);
        assert!(sink.color.is_none());
        assert!(green.color.is_some());
        assert!(green.plain().color.is_none());
    }
}

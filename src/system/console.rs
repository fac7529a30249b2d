// src/system/console.rs

use anyhow::Result;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::collections::VecDeque;
use std::sync::Mutex;

/// The run loop's input source.
///
/// `Terminal` prompts a human through `dialoguer`; `Preset` replays seeded
/// responses, which is how interactive-mode behavior (prompting, the safety
/// valve confirmation, environment selection) is exercised in tests.
#[derive(Debug)]
pub enum ConsoleInput {
    Terminal,
    Preset(Mutex<VecDeque<String>>),
}

impl ConsoleInput {
    pub fn terminal() -> Self {
        Self::Terminal
    }

    pub fn preset<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Preset(Mutex::new(lines.into_iter().map(Into::into).collect()))
    }

    fn pop(&self) -> Option<String> {
        match self {
            Self::Terminal => None,
            Self::Preset(queue) => queue.lock().ok()?.pop_front(),
        }
    }

    /// Reads one line of input. `None` means the source is exhausted (end of
    /// file on a terminal, empty queue for a preset) and the loop should end.
    pub fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        match self {
            Self::Terminal => {
                let result = Input::<String>::with_theme(&ColorfulTheme::default())
                    .with_prompt(prompt)
                    .allow_empty(true)
                    .interact_text();
                match result {
                    Ok(line) => Ok(Some(line)),
                    Err(e) => {
                        log::debug!("input ended: {e}");
                        Ok(None)
                    }
                }
            }
            Self::Preset(_) => Ok(self.pop()),
        }
    }

    /// Asks a yes/no question, defaulting to no.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        match self {
            Self::Terminal => Ok(Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .default(false)
                .interact()?),
            Self::Preset(_) => {
                let answer = self.pop().unwrap_or_default();
                Ok(matches!(
                    answer.trim().to_lowercase().as_str(),
                    "y" | "yes" | "true"
                ))
            }
        }
    }

    /// Asks the user to pick one of `items`. `None` means the selection was
    /// cancelled or the preset response did not match any item.
    pub fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        match self {
            Self::Terminal => Ok(Select::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .items(items)
                .default(0)
                .interact_opt()?),
            Self::Preset(_) => {
                let Some(answer) = self.pop() else {
                    return Ok(None);
                };
                let answer = answer.trim();
                if let Ok(index) = answer.parse::<usize>() {
                    return Ok((index < items.len()).then_some(index));
                }
                Ok(items.iter().position(|item| item == answer))
            }
        }
    }
}

// MARK: --- UNIT TESTS ---

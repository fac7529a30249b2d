// src/core/script_loader.rs

//! Thin I/O wrapper turning a TOML file of script and alias definitions into
//! a [`ScriptSource`]. The core itself is in-memory only; this is the edge
//! that feeds it.
//!
//! ```toml
//! [aliases]
//! g = "greet"
//!
//! [scripts]
//! greet = "echo hello [0]"
//! release = ["tag [0!]", "push [*]"]
//!
//! [scripts."deploy all"]
//! run = ["echo deploying [*]"]
//! desc = "Deploy every target."
//! group = "release"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::script::Script;
use crate::core::sources::ScriptSource;
use crate::models::HandlerInfo;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error while reading scripts: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML file at '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A script definition as written by the user. Untagged for flexible syntax:
/// a single line, a sequence of lines, or an extended table with metadata.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ScriptDef {
    Sequence(Vec<String>),
    Simple(String),
    Extended(ExtendedScript),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Lines {
    Sequence(Vec<String>),
    Single(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExtendedScript {
    pub run: Lines,
    pub desc: Option<String>,
    pub usage: Option<String>,
    pub group: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

/// The deserialized shape of a scripts file.
#[derive(Deserialize, Debug, Default)]
pub struct ScriptFile {
    #[serde(default)]
    pub scripts: HashMap<String, ScriptDef>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl ScriptFile {
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, LoadError> {
        toml::from_str(content).map_err(|e| LoadError::TomlParse {
            path: origin.to_path_buf(),
            source: e,
        })
    }
}

fn lines_of(lines: Lines) -> Vec<String> {
    match lines {
        Lines::Single(s) => vec![s],
        Lines::Sequence(s) => s,
    }
}

/// Builds a [`ScriptSource`] and the alias pairs from a parsed file.
pub fn build_source(file: ScriptFile) -> Result<(ScriptSource, Vec<(String, String)>)> {
    let mut source = ScriptSource::new();
    // Deterministic registration order regardless of map iteration order.
    let mut entries: Vec<(String, ScriptDef)> = file.scripts.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (verb, def) in entries {
        let (lines, info) = match def {
            ScriptDef::Simple(line) => (vec![line], HandlerInfo::new(&verb, "User script.")),
            ScriptDef::Sequence(lines) => (lines, HandlerInfo::new(&verb, "User script.")),
            ScriptDef::Extended(ext) => {
                let mut info = HandlerInfo::new(
                    &verb,
                    ext.desc.unwrap_or_else(|| "User script.".to_string()),
                );
                if let Some(usage) = ext.usage {
                    info = info.usage(usage);
                }
                if let Some(group) = ext.group {
                    info = info.group(group);
                }
                if ext.hidden {
                    info = info.hidden();
                }
                (lines_of(ext.run), info)
            }
        };
        let script = Script::new(info, lines)
            .with_context(|| format!("Failed to register script '{verb}'"))?;
        source = source
            .script(script)
            .with_context(|| format!("Failed to register script '{verb}'"))?;
    }

    let mut aliases: Vec<(String, String)> = file.aliases.into_iter().collect();
    aliases.sort();
    Ok((source, aliases))
}

/// Reads, parses and registers a scripts file.
pub fn load_file(path: &Path) -> Result<(ScriptSource, Vec<(String, String)>)> {
    let content = fs::read_to_string(path).map_err(LoadError::Io)?;
    let file = ScriptFile::from_toml_str(&content, path)?;
    log::debug!(
        "loaded {} script(s) and {} alias(es) from {}",
        file.scripts.len(),
        file.aliases.len(),
        path.display()
    );
    build_source(file)
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sources::HandlerSource;

    const SAMPLE: &str = r#"
[aliases]
g = "greet"

[scripts]
greet = "echo hello [0]"
release = ["tag [0!]", "push [*]"]

[scripts."deploy all"]
run = ["echo deploying [*]"]
desc = "Deploy every target."
group = "release"
hidden = true
"#;

    #[test]
    fn parses_every_definition_shape() {
        let file = ScriptFile::from_toml_str(SAMPLE, Path::new("sample.toml")).unwrap();
        assert_eq!(file.scripts.len(), 3);
        assert_eq!(file.aliases.get("g").map(String::as_str), Some("greet"));
        assert!(matches!(file.scripts.get("greet"), Some(ScriptDef::Simple(_))));
        assert!(matches!(
            file.scripts.get("release"),
            Some(ScriptDef::Sequence(lines)) if lines.len() == 2
        ));
        assert!(matches!(
            file.scripts.get("deploy all"),
            Some(ScriptDef::Extended(_))
        ));
    }

    #[test]
    fn builds_a_source_with_metadata_and_aliases() {
        let file = ScriptFile::from_toml_str(SAMPLE, Path::new("sample.toml")).unwrap();
        let (source, aliases) = build_source(file).unwrap();
        assert_eq!(aliases, vec![("g".to_string(), "greet".to_string())]);

        let entries = source.entries();
        assert_eq!(entries.len(), 3);
        let deploy = entries.iter().find(|e| e.verb == "deploy all").unwrap();
        assert_eq!(deploy.description, "Deploy every target.");
        assert_eq!(deploy.group, "release");
        assert!(deploy.hidden);
    }

    #[test]
    fn malformed_toml_is_a_typed_load_error() {
        let result = ScriptFile::from_toml_str("scripts = 3", Path::new("bad.toml"));
        assert!(matches!(result, Err(LoadError::TomlParse { .. })));
    }
}

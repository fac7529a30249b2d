// src/core/script.rs

//! # Script Expansion
//!
//! A script is a verb plus an ordered list of raw template lines. Each line
//! compiles, lazily and once, into a [`CommandFormat`]: an ordered list of
//! argument-accessor operations. Executing a compiled line against the
//! caller's arguments produces a brand-new argument sequence for a derived
//! command, consuming the caller arguments it fetches as it goes.
//!
//! Line syntax:
//!
//! ```text
//! greet [0] name=['n':"anon"] -v [-verbose] [*]
//! ```
//!
//! - bare word, `name=value`, `-name`: literal positional / named / flag;
//! - `[0]`: fetch positional by index; `['n']`: fetch named by name;
//!   `[-f]`: fetch flag by name;
//! - `[*]` / `[=*]` / `[-*]`: fetch every remaining positional / named / flag;
//! - `:` plus a quoted default inside the brackets; `!` marks the fetch
//!   required;
//! - a `name=` or `-name=` left-hand side re-emits the fetched value as a
//!   named argument or flag under that name.

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::OnceLock;

use crate::core::grammars::Grammar;
use crate::errors::{ParseError, ShellError};
use crate::models::{Argument, Arguments, HandlerInfo, Verb};

lazy_static! {
    /// Inner content of an accessor token: a specifier, an optional quoted
    /// default after `:`, and an optional trailing `!`.
    static ref ACCESSOR_RE: Regex = Regex::new(
        r#"^\s*(\*|=\*|-\*|\d+|'[^']*'|-[^\s:!\]]+)\s*(?::\s*(?:'([^']*)'|"([^"]*)"))?\s*(!)?\s*$"#
    )
    .unwrap();
}

// --- COMPILED FORM ---

/// Where a fetch accessor reads from in the caller's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorSource {
    Positional { index: usize },
    Named { name: String },
    Flag { name: String },
    AllPositionals,
    AllNamed,
    AllFlags,
}

/// The argument kind a single-fetch accessor re-emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitShape {
    Positional,
    Named { name: String },
    Flag { name: String },
}

/// One fetch operation: source, output shape, and modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorDef {
    pub source: AccessorSource,
    pub emit: EmitShape,
    pub required: bool,
    pub default_value: Option<String>,
    pub original_token: String,
}

/// One compiled operation of a script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOp {
    /// Emits a fixed argument, ignoring caller input.
    Literal(Argument),
    Accessor(AccessorDef),
}

/// An ordered list of operations compiled from one script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormat {
    ops: Vec<FormatOp>,
}

impl CommandFormat {
    pub fn ops(&self) -> &[FormatOp] {
        &self.ops
    }

    /// Runs every operation against the caller's arguments, producing the
    /// derived command's argument sequence. Consumption of caller arguments
    /// is permanent: later accessors in this line observe it, and so does
    /// the caller's own inspection afterwards.
    pub fn execute(&self, caller: &mut Arguments) -> Result<Arguments, ShellError> {
        let mut out = Arguments::new();
        for op in &self.ops {
            match op {
                FormatOp::Literal(arg) => out.push(arg.clone()),
                FormatOp::Accessor(def) => def.apply(caller, &mut out)?,
            }
        }
        Ok(out)
    }
}

impl AccessorDef {
    fn apply(&self, caller: &mut Arguments, out: &mut Arguments) -> Result<(), ShellError> {
        match &self.source {
            AccessorSource::Positional { index } => {
                let got = caller.positional(*index);
                self.emit_value(got.value().map(str::to_string), out)
            }
            AccessorSource::Named { name } => {
                let got = caller.named(name);
                self.emit_value(got.value().map(str::to_string), out)
            }
            AccessorSource::Flag { name } => {
                let present = caller.flag(name).is_present();
                if !present && self.required {
                    return Err(ShellError::MissingRequiredArgument {
                        token: self.original_token.clone(),
                    });
                }
                if present {
                    if let EmitShape::Flag { name } = &self.emit {
                        out.push(Argument::flag(name.clone()));
                    }
                }
                Ok(())
            }
            AccessorSource::AllPositionals => {
                for arg in caller.take_positionals() {
                    if let Some(value) = arg.value() {
                        out.push(Argument::positional(value));
                    }
                }
                Ok(())
            }
            AccessorSource::AllNamed => {
                for arg in caller.take_named() {
                    if let (Some(name), Some(value)) = (arg.name(), arg.value()) {
                        out.push(Argument::named(name, value));
                    }
                }
                Ok(())
            }
            AccessorSource::AllFlags => {
                for arg in caller.take_flags() {
                    if let Some(name) = arg.name() {
                        out.push(Argument::flag(name));
                    }
                }
                Ok(())
            }
        }
    }

    fn emit_value(&self, fetched: Option<String>, out: &mut Arguments) -> Result<(), ShellError> {
        let value = match fetched.or_else(|| self.default_value.clone()) {
            Some(v) => v,
            None => {
                if self.required {
                    return Err(ShellError::MissingRequiredArgument {
                        token: self.original_token.clone(),
                    });
                }
                // Absent, optional, no default: the token emits nothing.
                return Ok(());
            }
        };
        match &self.emit {
            EmitShape::Positional => out.push(Argument::positional(value)),
            EmitShape::Named { name } => out.push(Argument::named(name.clone(), value)),
            EmitShape::Flag { name } => out.push(Argument::flag(name.clone())),
        }
        Ok(())
    }
}

// --- LINE COMPILATION ---

/// Splits a script line into tokens. Brackets are atomic (quotes and spaces
/// inside them do not split); quotes protect whitespace outside brackets.
fn split_tokens(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut open_quote: Option<char> = None;
    let mut in_bracket = false;

    for ch in line.chars() {
        match open_quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    open_quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => {
                    open_quote = Some(ch);
                    current.push(ch);
                }
                '[' if !in_bracket => {
                    in_bracket = true;
                    current.push(ch);
                }
                ']' if in_bracket => {
                    in_bracket = false;
                    current.push(ch);
                }
                c if c.is_whitespace() && !in_bracket => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }
    if let Some(q) = open_quote {
        return Err(ParseError::UnterminatedQuote(q));
    }
    if in_bracket {
        return Err(ParseError::Malformed("unterminated '[' accessor".to_string()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn compile_line(line: &str) -> Result<CommandFormat, ShellError> {
    let mut ops = Vec::new();
    for token in split_tokens(line)? {
        ops.push(compile_token(&token)?);
    }
    if ops.is_empty() {
        return Err(ParseError::EmptyInput.into());
    }
    Ok(CommandFormat { ops })
}

fn compile_token(token: &str) -> Result<FormatOp, ShellError> {
    let bracket = token.find('[');
    let Some(open) = bracket else {
        return compile_literal(token);
    };
    if !token.ends_with(']') {
        return Err(ParseError::Malformed(format!(
            "accessor token '{token}' must end with ']'"
        ))
        .into());
    }

    // Optional left-hand side: `name=` re-emits as named, `-name=` as flag.
    let lhs = &token[..open];
    let emit_override = if lhs.is_empty() {
        None
    } else if let Some(name) = lhs.strip_suffix('=') {
        if name.is_empty() {
            return Err(ParseError::Malformed(format!(
                "accessor token '{token}' has an empty re-emit name"
            ))
            .into());
        }
        if let Some(flag) = name.strip_prefix('-') {
            Some(EmitShape::Flag {
                name: flag.to_string(),
            })
        } else {
            Some(EmitShape::Named {
                name: name.to_string(),
            })
        }
    } else {
        return Err(ParseError::Malformed(format!(
            "unexpected text '{lhs}' before accessor in '{token}'"
        ))
        .into());
    };

    let inner = &token[open + 1..token.len() - 1];
    let caps = ACCESSOR_RE.captures(inner).ok_or_else(|| {
        ParseError::Malformed(format!("invalid accessor '{token}'"))
    })?;
    let spec = caps.get(1).map_or("", |m| m.as_str());
    let default_value = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string());
    let required = caps.get(4).is_some();

    let source = if spec == "*" {
        AccessorSource::AllPositionals
    } else if spec == "=*" {
        AccessorSource::AllNamed
    } else if spec == "-*" {
        AccessorSource::AllFlags
    } else if let Ok(index) = spec.parse::<usize>() {
        AccessorSource::Positional { index }
    } else if let Some(name) = spec.strip_prefix('-') {
        AccessorSource::Flag {
            name: name.to_string(),
        }
    } else {
        // 'name': quoted named specifier.
        let name = spec.trim_matches('\'');
        AccessorSource::Named {
            name: name.to_string(),
        }
    };

    // Shape and modifier validity depends on the source kind.
    let emit = match (&source, emit_override) {
        (AccessorSource::Flag { name }, None) => EmitShape::Flag { name: name.clone() },
        (AccessorSource::Flag { .. }, Some(shape @ EmitShape::Flag { .. })) => shape,
        (AccessorSource::Flag { .. }, Some(_)) => {
            return Err(ParseError::Malformed(format!(
                "flag accessor '{token}' can only re-emit as a flag"
            ))
            .into());
        }
        (AccessorSource::Positional { .. } | AccessorSource::Named { .. }, None) => {
            EmitShape::Positional
        }
        (
            AccessorSource::Positional { .. } | AccessorSource::Named { .. },
            Some(shape @ EmitShape::Named { .. }),
        ) => shape,
        (AccessorSource::Positional { .. } | AccessorSource::Named { .. }, Some(_)) => {
            return Err(ParseError::Malformed(format!(
                "value accessor '{token}' cannot re-emit as a flag"
            ))
            .into());
        }
        (_, Some(_)) => {
            return Err(ParseError::Malformed(format!(
                "fetch-all accessor '{token}' cannot be renamed"
            ))
            .into());
        }
        (_, None) => EmitShape::Positional,
    };

    if matches!(source, AccessorSource::Flag { .. }) && default_value.is_some() {
        return Err(ParseError::Malformed(format!(
            "flag accessor '{token}' cannot carry a default; flags are presence-only"
        ))
        .into());
    }
    if matches!(
        source,
        AccessorSource::AllPositionals | AccessorSource::AllNamed | AccessorSource::AllFlags
    ) && (default_value.is_some() || required)
    {
        return Err(ParseError::Malformed(format!(
            "fetch-all accessor '{token}' takes no modifiers"
        ))
        .into());
    }

    Ok(FormatOp::Accessor(AccessorDef {
        source,
        emit,
        required,
        default_value,
        original_token: token.to_string(),
    }))
}

/// Literal tokens follow the simplified grammar: bare positional,
/// `name=value`, `-flag`, quotes stripped.
fn compile_literal(token: &str) -> Result<FormatOp, ShellError> {
    let mut parsed = Grammar::Simplified.parse(token)?;
    let arg = parsed.shift();
    let arg = if arg.is_present() {
        arg
    } else {
        // The token was a flag or named argument, not a positional.
        parsed
            .items()
            .first()
            .cloned()
            .ok_or_else(|| ParseError::Malformed(format!("empty literal token '{token}'")))?
    };
    let fresh = match arg {
        Argument::Positional { value, .. } => Argument::positional(value),
        Argument::Named { name, value, .. } => Argument::named(name, value),
        Argument::Flag { name, .. } => Argument::flag(name),
        Argument::Missing { .. } => {
            return Err(ParseError::Malformed(format!("empty literal token '{token}'")).into());
        }
    };
    Ok(FormatOp::Literal(fresh))
}

// --- SCRIPT ---

/// One raw template line and its memoized compiled form.
#[derive(Debug)]
pub struct ScriptLine {
    raw: String,
    compiled: OnceLock<CommandFormat>,
}

impl ScriptLine {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            compiled: OnceLock::new(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Compiles on first use; every later call returns the same compiled
    /// instance.
    pub fn format(&self) -> Result<&CommandFormat, ShellError> {
        if let Some(format) = self.compiled.get() {
            return Ok(format);
        }
        let format = compile_line(&self.raw)?;
        log::debug!("compiled script line '{}'", self.raw);
        Ok(self.compiled.get_or_init(|| format))
    }
}

/// A verb bound to an ordered list of template lines, registered and invoked
/// exactly like any other multi-word handler.
#[derive(Debug)]
pub struct Script {
    verb: Verb,
    info: HandlerInfo,
    lines: Vec<ScriptLine>,
}

impl Script {
    pub fn new(info: HandlerInfo, lines: Vec<String>) -> Result<Self, ShellError> {
        let verb = Verb::parse(&info.verb)?;
        Ok(Self {
            verb,
            info,
            lines: lines.into_iter().map(ScriptLine::new).collect(),
        })
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    pub fn info(&self) -> &HandlerInfo {
        &self.info
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    /// Expands every line in order against the caller's arguments, returning
    /// one derived argument sequence per line.
    pub fn expand(&self, caller: &mut Arguments) -> Result<Vec<Arguments>, ShellError> {
        let mut derived = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            derived.push(line.format()?.execute(caller)?);
        }
        Ok(derived)
    }
}

// MARK: --- UNIT TESTS ---

// src/core/grammars.rs

//! # Argument Grammars
//!
//! Four independent grammars turn a raw command line into an [`Arguments`]
//! sequence. Each is a pure function of its input; the engine is configured
//! with exactly one of them. The grammars disagree on purpose, since they
//! model the conventions of different shells, and two of them (POSIX and
//! PowerShell) deliberately emit more than one interpretation of the same
//! token, leaving disambiguation to whichever accessor the handler calls.

use crate::errors::{ParseError, ShellError};
use crate::models::{Argument, Arguments};

/// The grammar the engine parses raw lines with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grammar {
    /// Whitespace-delimited tokens; `name=value` names, `-name` flags.
    #[default]
    Simplified,
    /// `-x` short flags (combinable), `--name` long flags, value binding.
    Posix,
    /// `-name` is simultaneously flag, named and positional.
    PowerShell,
    /// `/name` flags, `/name:value` names, empty-string exhaustion sentinel.
    Cmd,
}

impl Grammar {
    /// Looks a grammar up by its configuration name.
    pub fn from_name(name: &str) -> Result<Self, ShellError> {
        match name.to_lowercase().as_str() {
            "simplified" => Ok(Self::Simplified),
            "posix" => Ok(Self::Posix),
            "powershell" => Ok(Self::PowerShell),
            "cmd" => Ok(Self::Cmd),
            other => Err(ShellError::Build(format!("unknown grammar '{other}'"))),
        }
    }

    /// Parses a raw line. An empty or all-whitespace line is a typed failure:
    /// there is no valid empty command.
    pub fn parse(&self, line: &str) -> Result<Arguments, ShellError> {
        let words = lex_words(line)?;
        if words.is_empty() {
            return Err(ParseError::EmptyInput.into());
        }
        log::trace!("{:?} grammar parsing {} word(s)", self, words.len());
        Ok(match self {
            Self::Simplified => parse_simplified(&words),
            Self::Posix => parse_posix(&words),
            Self::PowerShell => parse_powershell(&words),
            Self::Cmd => parse_cmd(&words),
        })
    }

    /// Renders an argument sequence back into a line this grammar accepts.
    /// For any line `s` this grammar parses, `parse(render(parse(s)))` equals
    /// `parse(s)`.
    pub fn render(&self, args: &Arguments) -> String {
        match self {
            Self::Simplified => render_simplified(args),
            Self::Posix => render_posix(args),
            Self::PowerShell => render_powershell(args),
            Self::Cmd => render_cmd(args),
        }
    }
}

// --- LEXER ---

/// One whitespace-delimited word with a per-character "was quoted" mask, so
/// classification can tell a structural `-`/`=`/`:` from a quoted one.
#[derive(Debug, Clone)]
struct Word {
    chars: Vec<char>,
    mask: Vec<bool>,
}

impl Word {
    fn text(&self) -> String {
        self.chars.iter().collect()
    }

    fn starts_unquoted(&self, c: char) -> bool {
        self.chars.first() == Some(&c) && self.mask.first() == Some(&false)
    }

    fn find_unquoted(&self, c: char) -> Option<usize> {
        self.chars
            .iter()
            .zip(&self.mask)
            .position(|(ch, quoted)| *ch == c && !quoted)
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.chars[from..to].iter().collect()
    }

    fn tail(&self, from: usize) -> String {
        self.slice(from, self.chars.len())
    }

    fn len(&self) -> usize {
        self.chars.len()
    }
}

/// Splits a line into words. Single and double quotes protect whitespace and
/// are stripped; no escaping exists beyond the delimiter itself. A quote left
/// open at the end of the line is a typed parse failure.
fn lex_words(line: &str) -> Result<Vec<Word>, ParseError> {
    let mut words = Vec::new();
    let mut current = Word {
        chars: Vec::new(),
        mask: Vec::new(),
    };
    let mut had_quote = false;
    let mut open_quote: Option<char> = None;

    for ch in line.chars() {
        match open_quote {
            Some(q) if ch == q => open_quote = None,
            Some(_) => {
                current.chars.push(ch);
                current.mask.push(true);
            }
            None if ch == '\'' || ch == '"' => {
                open_quote = Some(ch);
                had_quote = true;
            }
            None if ch.is_whitespace() => {
                if !current.chars.is_empty() || had_quote {
                    words.push(current);
                    current = Word {
                        chars: Vec::new(),
                        mask: Vec::new(),
                    };
                    had_quote = false;
                }
            }
            None => {
                current.chars.push(ch);
                current.mask.push(false);
            }
        }
    }

    if let Some(q) = open_quote {
        return Err(ParseError::UnterminatedQuote(q));
    }
    if !current.chars.is_empty() || had_quote {
        words.push(current);
    }
    Ok(words)
}

// --- SIMPLIFIED GRAMMAR ---

fn parse_simplified(words: &[Word]) -> Arguments {
    let mut args = Arguments::new();
    for word in words {
        if word.starts_unquoted('-') && word.len() > 1 {
            args.push(Argument::flag(word.tail(1)));
        } else if let Some(eq) = word.find_unquoted('=')
            && eq > 0
        {
            args.push(Argument::named(word.slice(0, eq), word.tail(eq + 1)));
        } else {
            args.push(Argument::positional(word.text()));
        }
    }
    args
}

// --- POSIX GRAMMAR ---

fn parse_posix(words: &[Word]) -> Arguments {
    let mut args = Arguments::new();
    let mut i = 0;
    while i < words.len() {
        let word = &words[i];
        if word.starts_unquoted('-') && word.len() > 2 && word.chars[1] == '-' && !word.mask[1] {
            // Long option. `--name=value` and `--name value` both bind the
            // value as named while the flag stays set and the value stays
            // visible as a positional.
            if let Some(eq) = word.find_unquoted('=') {
                let name = word.slice(2, eq);
                let value = word.tail(eq + 1);
                args.push(Argument::flag(name.clone()));
                args.push(Argument::named(name, value.clone()));
                args.push(Argument::positional(value));
            } else {
                let name = word.tail(2);
                if let Some(next) = words.get(i + 1)
                    && !next.starts_unquoted('-')
                {
                    let value = next.text();
                    args.push(Argument::flag(name.clone()));
                    args.push(Argument::named(name, value.clone()));
                    args.push(Argument::positional(value));
                    i += 2;
                    continue;
                }
                args.push(Argument::flag(name));
            }
        } else if word.starts_unquoted('-') && word.len() > 1 {
            if word.len() == 2 {
                // Single short flag; a following bare token binds as its
                // value and remains a positional.
                let name = word.tail(1);
                if let Some(next) = words.get(i + 1)
                    && !next.starts_unquoted('-')
                {
                    let value = next.text();
                    args.push(Argument::flag(name.clone()));
                    args.push(Argument::named(name, value.clone()));
                    args.push(Argument::positional(value));
                    i += 2;
                    continue;
                }
                args.push(Argument::flag(name));
            } else {
                // `-xyz` is three combined short flags, never a value binding.
                for ch in word.chars.iter().skip(1) {
                    args.push(Argument::flag(ch.to_string()));
                }
            }
        } else {
            args.push(Argument::positional(word.text()));
        }
        i += 1;
    }
    args
}

// --- POWERSHELL GRAMMAR ---

fn parse_powershell(words: &[Word]) -> Arguments {
    let mut args = Arguments::new();
    for (i, word) in words.iter().enumerate() {
        if word.starts_unquoted('-') && word.len() > 1 {
            // Ambiguous on purpose: emit flag, named and positional readings
            // of the same token. The named value is the next bare token, if
            // any; that token is not consumed here and also parses as its own
            // positional.
            let name = word.tail(1);
            let value = words
                .get(i + 1)
                .filter(|next| !next.starts_unquoted('-'))
                .map_or_else(String::new, Word::text);
            args.push(Argument::flag(name.clone()));
            args.push(Argument::named(name, value));
            args.push(Argument::positional(word.text()));
        } else {
            args.push(Argument::positional(word.text()));
        }
    }
    args
}

// --- WINDOWS-CMD GRAMMAR ---

fn parse_cmd(words: &[Word]) -> Arguments {
    let mut args = Arguments::new().with_empty_sentinel();
    let mut i = 0;
    while i < words.len() {
        let word = &words[i];
        if word.starts_unquoted('/') && word.len() > 1 {
            if let Some(colon) = word.find_unquoted(':') {
                args.push(Argument::named(word.slice(1, colon), word.tail(colon + 1)));
            } else if let Some(next) = words.get(i + 1)
                && !next.starts_unquoted('/')
            {
                // `/name value`: the bare token is the value, not a separate
                // positional.
                args.push(Argument::named(word.tail(1), next.text()));
                i += 2;
                continue;
            } else {
                args.push(Argument::flag(word.tail(1)));
            }
        } else {
            args.push(Argument::positional(word.text()));
        }
        i += 1;
    }
    args
}

// --- RENDERERS ---

fn quote_if_needed(value: &str, extra: &[char]) -> String {
    let needs = value.is_empty()
        || value.chars().any(char::is_whitespace)
        || value.starts_with(extra)
        || value.contains('=');
    if needs {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

fn render_simplified(args: &Arguments) -> String {
    let mut parts = Vec::new();
    for arg in args.items() {
        match arg {
            Argument::Positional { value, .. } => parts.push(quote_if_needed(value, &['-'])),
            Argument::Named { name, value, .. } => {
                let v = if value.is_empty() || value.chars().any(char::is_whitespace) {
                    format!("\"{value}\"")
                } else {
                    value.clone()
                };
                parts.push(format!("{name}={v}"));
            }
            Argument::Flag { name, .. } => parts.push(format!("-{name}")),
            Argument::Missing { .. } => {}
        }
    }
    parts.join(" ")
}

/// Renders POSIX arguments, collapsing the flag/named/positional triples the
/// parser emits for `-x value` back into their source form.
fn render_posix(args: &Arguments) -> String {
    let items = args.items();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < items.len() {
        match (&items[i], items.get(i + 1), items.get(i + 2)) {
            (
                Argument::Flag { name: f, .. },
                Some(Argument::Named { name: n, value, .. }),
                Some(Argument::Positional { value: p, .. }),
            ) if f == n && value == p => {
                let dashes = if f.chars().count() == 1 { "-" } else { "--" };
                parts.push(format!("{dashes}{f} {}", quote_if_needed(value, &['-'])));
                i += 3;
            }
            (Argument::Flag { name, .. }, _, _) => {
                let dashes = if name.chars().count() == 1 { "-" } else { "--" };
                parts.push(format!("{dashes}{name}"));
                i += 1;
            }
            (Argument::Positional { value, .. }, _, _) => {
                parts.push(quote_if_needed(value, &['-']));
                i += 1;
            }
            (Argument::Named { name, value, .. }, _, _) => {
                // A named argument built by hand rather than by this parser.
                parts.push(format!("--{name} {}", quote_if_needed(value, &['-'])));
                i += 1;
            }
            (Argument::Missing { .. }, _, _) => i += 1,
        }
    }
    parts.join(" ")
}

/// Renders PowerShell arguments, collapsing the parser's triple emission for
/// `-name` back into the single source token. The bound value, when one
/// followed, is also present as its own positional and renders there.
fn render_powershell(args: &Arguments) -> String {
    let items = args.items();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < items.len() {
        match (&items[i], items.get(i + 1), items.get(i + 2)) {
            (
                Argument::Flag { name: f, .. },
                Some(Argument::Named { name: n, .. }),
                Some(Argument::Positional { value: p, .. }),
            ) if f == n && *p == format!("-{f}") => {
                parts.push(format!("-{f}"));
                i += 3;
            }
            (Argument::Flag { name, .. }, _, _) => {
                parts.push(format!("-{name}"));
                i += 1;
            }
            (Argument::Positional { value, .. }, _, _) => {
                parts.push(quote_if_needed(value, &['-']));
                i += 1;
            }
            (Argument::Named { name, value, .. }, _, _) => {
                parts.push(format!("-{name} {}", quote_if_needed(value, &['-'])));
                i += 1;
            }
            (Argument::Missing { .. }, _, _) => i += 1,
        }
    }
    parts.join(" ")
}

fn render_cmd(args: &Arguments) -> String {
    let mut parts = Vec::new();
    for arg in args.items() {
        match arg {
            Argument::Positional { value, .. } => parts.push(quote_if_needed(value, &['/'])),
            Argument::Named { name, value, .. } => {
                if value.chars().any(char::is_whitespace) || value.is_empty() {
                    parts.push(format!("/{name}:\"{value}\""));
                } else {
                    parts.push(format!("/{name}:{value}"));
                }
            }
            Argument::Flag { name, .. } => parts.push(format!("/{name}")),
            Argument::Missing { .. } => {}
        }
    }
    parts.join(" ")
}

// MARK: --- UNIT TESTS ---

use clap::Parser;
use std::path::PathBuf;

pub mod builtins;

/// tiller: a verb-dispatch command shell.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a TOML file of scripts and aliases to register.
    #[arg(long, short)]
    pub scripts: Option<PathBuf>,

    /// Argument grammar: simplified, posix, powershell or cmd.
    #[arg(long, default_value = "simplified")]
    pub grammar: String,

    /// Environment names to register (e.g. "dev,staging,prod").
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub env: Vec<String>,

    /// How many consecutive scripted commands may run before the safety
    /// valve trips.
    #[arg(long)]
    pub limit: Option<usize>,

    /// The command line to run headlessly. Interactive when omitted.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

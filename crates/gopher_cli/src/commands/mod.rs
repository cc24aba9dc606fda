//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use gopher_core::DuplicatePolicy;

pub mod convert;

/// gopherhole - configurable XML to JSON conversion
#[derive(Parser, Debug)]
#[command(name = "gopherhole")]
#[command(version, about = "gopherhole - configurable XML to JSON conversion")]
#[command(long_about = r#"
Converts an XML file into JSON shaped by a configuration file.

The configuration maps each collection name to a one-element array holding an
object template. Template strings embed symbols naming XML paths:

  {"Patients": [{"id": "<Patients.Patient.ID>",
                 "age": "<Patients.Patient.DateOfBirth transform=yearsElapsed>"}]}

EXIT CODES:
  0 - Success
  1 - General error
  3 - Conversion reported errors (with --strict)
"#)]
pub struct Cli {
    /// XML file to convert
    #[arg(default_value = "input.xml")]
    pub input: PathBuf,

    /// Configuration file (JSON, or YAML by extension)
    #[arg(default_value = "config.json")]
    pub config: PathBuf,

    /// Write the JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,

    /// Options file (TOML, JSON or YAML)
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Date treated as today by date modifiers (YYYY-MM-DD)
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,

    /// Deepest element nesting to resolve
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Empty a collection when its element opens again
    #[arg(long)]
    pub reset_on_reopen: bool,

    /// Which field keeps a symbol used by several fields
    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicateArg>,

    /// Exit with code 3 when the conversion reports errors
    #[arg(long)]
    pub strict: bool,

    /// Do not print the welcome banner
    #[arg(long)]
    pub no_banner: bool,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicateArg {
    LastWins,
    FirstWins,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::LastWins => DuplicatePolicy::LastWins,
            DuplicateArg::FirstWins => DuplicatePolicy::FirstWins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["gopherhole"]);
        assert_eq!(cli.input, PathBuf::from("input.xml"));
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(!cli.strict);
    }

    #[test]
    fn test_positionals_and_flags() {
        let cli = Cli::parse_from([
            "gopherhole",
            "patients.xml",
            "patients.yaml",
            "--reference-date",
            "2025-01-01",
            "--duplicates",
            "first-wins",
            "--max-depth",
            "3",
        ]);
        assert_eq!(cli.input, PathBuf::from("patients.xml"));
        assert_eq!(cli.config, PathBuf::from("patients.yaml"));
        assert_eq!(cli.reference_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(cli.duplicates, Some(DuplicateArg::FirstWins));
        assert_eq!(cli.max_depth, Some(3));
    }
}

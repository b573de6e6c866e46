use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
    /// Show all available debugging information
    Debug,
}

/// Supplement-claims corpus validator
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-claims")]
#[command(about = "Validate supplement claim files against schemas, vocabularies, \
filename conventions, and citation identifiers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate the corpus or an explicit set of claim files
    Validate(ValidateArgs),
    /// Rewrite legacy dosage fields into the structured dosage shape
    MigrateDosage(MigrateArgs),
    /// List the collections present in the corpus
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Claim files to validate; scans the whole corpus when empty
    #[arg(help = "Claim files to validate (omit to scan the whole corpus)")]
    pub files: Vec<PathBuf>,

    /// Corpus root directory
    #[arg(short = 'r', long = "root")]
    pub root: Option<PathBuf>,

    /// Directory holding <type>.schema.json documents
    #[arg(long = "schema-dir")]
    pub schema_dir: Option<PathBuf>,

    /// Directory holding <name>.yml vocabulary lists
    #[arg(long = "vocab-dir")]
    pub vocab_dir: Option<PathBuf>,

    /// Number of concurrently processed files
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Total lookup attempts per batch
    #[arg(long = "retry-attempts")]
    pub retry_attempts: Option<u32>,

    /// Bulk identifier lookup endpoint
    #[arg(long = "lookup-url")]
    pub lookup_url: Option<String>,

    /// Identifiers per bulk request
    #[arg(long = "batch-size")]
    pub batch_size: Option<usize>,

    /// Configuration file (TOML)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl ValidateArgs {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Claim files to migrate (omit to scan the whole corpus)
    pub files: Vec<PathBuf>,

    /// Corpus root directory
    #[arg(short = 'r', long = "root", default_value = ".")]
    pub root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Corpus root directory
    #[arg(short = 'r', long = "root", default_value = ".")]
    pub root: PathBuf,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subcommand_parsing() {
        let cli = Cli::try_parse_from(["validate-claims", "validate", "--root", "/corpus"]).unwrap();
        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.root, Some(PathBuf::from("/corpus")));
                assert!(args.files.is_empty());
            }
            other => panic!("Expected validate subcommand, got {other:?}"),
        }
    }

    #[test]
    fn test_selective_files_parsing() {
        let cli = Cli::try_parse_from([
            "validate-claims",
            "validate",
            "supplements/creatine/claims/effects/a.yml",
            "supplements/creatine/claims/effects/b.yml",
        ])
        .unwrap();
        match cli.command {
            Command::Validate(args) => assert_eq!(args.files.len(), 2),
            other => panic!("Expected validate subcommand, got {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["validate-claims", "validate", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_resolution() {
        let cli = Cli::try_parse_from(["validate-claims", "validate", "-v"]).unwrap();
        match cli.command {
            Command::Validate(args) => assert_eq!(args.verbosity(), VerbosityLevel::Verbose),
            other => panic!("Expected validate subcommand, got {other:?}"),
        }
    }

    #[test]
    fn test_migrate_subcommand_parsing() {
        let cli = Cli::try_parse_from(["validate-claims", "migrate-dosage"]).unwrap();
        match cli.command {
            Command::MigrateDosage(args) => assert_eq!(args.root, PathBuf::from(".")),
            other => panic!("Expected migrate-dosage subcommand, got {other:?}"),
        }
    }
}

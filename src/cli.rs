use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::resolver::SaveInclusion;

/// dricfg - per-application graphics driver option configurator
#[derive(Parser)]
#[command(name = "dricfg")]
#[command(about = "Inspect and normalize per-application graphics driver options")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check schemas, policy and user configuration for consistency
    Check {
        /// Directory containing one JSON schema file per driver
        #[arg(short, long)]
        schema_dir: PathBuf,

        /// Path to the system-wide policy override file (optional)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Path to the user configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Merge, filter and re-save the user configuration in canonical form
    Normalize {
        /// Directory containing one JSON schema file per driver
        #[arg(short, long)]
        schema_dir: PathBuf,

        /// Path to the system-wide policy override file (optional)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Path to the user configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Which option values to persist (everything, non-default)
        #[arg(long, default_value = "everything")]
        include: SaveInclusion,

        /// Write the normalized configuration here instead of back to --config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_command_parses() {
        let cli = Cli::try_parse_from([
            "dricfg", "check", "--schema-dir", "/etc/dricfg/schemas", "--config", "drirc.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Check { schema_dir, policy, config } => {
                assert_eq!(schema_dir, PathBuf::from("/etc/dricfg/schemas"));
                assert!(policy.is_none());
                assert_eq!(config, PathBuf::from("drirc.json"));
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_normalize_include_values() {
        let cli = Cli::try_parse_from([
            "dricfg",
            "normalize",
            "--schema-dir",
            "schemas",
            "--config",
            "drirc.json",
            "--include",
            "non-default",
        ])
        .unwrap();
        match cli.command {
            Commands::Normalize { include, output, .. } => {
                assert_eq!(include, SaveInclusion::NonDefault);
                assert!(output.is_none());
            }
            _ => panic!("expected normalize command"),
        }
    }

    #[test]
    fn test_normalize_include_defaults_to_everything() {
        let cli = Cli::try_parse_from([
            "dricfg", "normalize", "--schema-dir", "schemas", "--config", "drirc.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Normalize { include, .. } => {
                assert_eq!(include, SaveInclusion::Everything);
            }
            _ => panic!("expected normalize command"),
        }
    }

    #[test]
    fn test_invalid_include_is_rejected() {
        let result = Cli::try_parse_from([
            "dricfg",
            "normalize",
            "--schema-dir",
            "schemas",
            "--config",
            "drirc.json",
            "--include",
            "sometimes",
        ]);
        assert!(result.is_err());
    }
}

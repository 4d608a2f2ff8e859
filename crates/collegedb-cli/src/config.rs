//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use collegedb_core::{StorageConfig, StoreConfig};

use crate::formatter::OutputFormat;

/// CollegeDB command-line interface
#[derive(Parser, Debug)]
#[command(name = "collegedb")]
#[command(version, about = "Inspect and manage a CollegeDB store")]
pub struct Args {
    /// Store directory
    #[arg(short = 'd', long, default_value = "./collegedb_data")]
    pub data_path: PathBuf,

    /// Enforce check constraints and column widths on writes
    #[arg(long)]
    pub strict: bool,

    /// Page cache size in MB
    #[arg(long, default_value_t = 64)]
    pub cache_mb: u64,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print tables, relations and constraints
    Schema,
    /// Replace the store contents with the fixture set
    Seed,
    /// List every row of a table
    List {
        /// Table name
        table: String,
    },
    /// Show one row
    Get {
        /// Table name
        table: String,
        /// Row identity
        id: u64,
    },
    /// Delete one row, applying delete rules
    Delete {
        /// Table name
        table: String,
        /// Row identity
        id: u64,
    },
}

impl Args {
    /// Build the store configuration.
    pub fn into_config(self) -> StoreConfig {
        let storage =
            StorageConfig::new(self.data_path).with_cache_capacity(self.cache_mb * 1024 * 1024);
        StoreConfig::default()
            .with_storage(storage)
            .with_enforce_checks(self.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["collegedb", "schema"]);
        assert_eq!(args.command, Command::Schema);
        assert_eq!(args.format, OutputFormat::Table);
        assert!(!args.strict);

        let config = args.into_config();
        assert_eq!(config.storage.path, PathBuf::from("./collegedb_data"));
        assert_eq!(config.storage.cache_capacity, 64 * 1024 * 1024);
        assert!(!config.enforce_checks);
    }

    #[test]
    fn test_subcommand_arguments() {
        let args = Args::parse_from([
            "collegedb",
            "--data-path",
            "/tmp/college",
            "--strict",
            "--cache-mb",
            "8",
            "--format",
            "json",
            "delete",
            "students",
            "4",
        ]);
        assert_eq!(
            args.command,
            Command::Delete {
                table: "students".into(),
                id: 4
            }
        );
        assert_eq!(args.format, OutputFormat::Json);

        let config = args.into_config();
        assert!(config.enforce_checks);
        assert_eq!(config.storage.cache_capacity, 8 * 1024 * 1024);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/college"));
    }

    #[test]
    fn test_rejects_bad_id() {
        assert!(Args::try_parse_from(["collegedb", "get", "courses", "abc"]).is_err());
    }
}

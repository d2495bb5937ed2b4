// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load, check and convert flowchart documents
#[derive(Parser, Debug)]
#[command(name = "flowmark")]
#[command(version)]
pub struct Cli {
    /// Codec settings file (RON)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a document and report what it contains
    Check {
        /// Document to read
        file: PathBuf,
    },
    /// Rewrite a document, optionally in another layout
    Convert {
        /// Document to read; the layout is taken from its root element
        input: PathBuf,
        /// Document to write
        output: PathBuf,
        /// Write the nested tree layout instead of the flat one
        #[arg(long)]
        tree: bool,
    },
    /// Write the built-in sample diagram
    Sample {
        /// Document to write
        output: PathBuf,
        /// Write the nested tree layout instead of the flat one
        #[arg(long)]
        tree: bool,
    },
    /// Print the effective codec settings as RON
    Settings,
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
    fn test_parse_convert() {
        let cli = Cli::try_parse_from(["flowmark", "-v", "convert", "a.xml", "b.xml", "--tree"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Convert { input, output, tree } => {
                assert_eq!(input, PathBuf::from("a.xml"));
                assert_eq!(output, PathBuf::from("b.xml"));
                assert!(tree);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_settings_flag() {
        let cli = Cli::try_parse_from(["flowmark", "check", "a.xml", "--settings", "codec.ron"]).unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("codec.ron")));
        assert!(Cli::try_parse_from(["flowmark", "check"]).is_err());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! `flowmark` - command line front end for flowchart documents.
//!
//! Reads documents in either layout (the root element decides), reports
//! their contents, and writes them back in the flat or the tree layout.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use flowmark_codec::{share_value, CodecError, CodecSettings};
use flowmark_diagram::codec::load_any;
use flowmark_diagram::sample::sample;
use flowmark_diagram::{DiagramCodec, DiagramError, FlowDiagram, Layout};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Errors reported by the command line tool
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Settings could not be loaded or printed
    #[error("Settings: {0}")]
    Settings(#[from] CodecError),

    /// A document could not be read or written
    #[error(transparent)]
    Diagram(#[from] DiagramError),

    /// Reading the input file failed
    #[error("Cannot read {path}: {source}")]
    Read {
        /// File that was read
        path: String,
        /// Underlying failure
        source: std::io::Error,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "flowmark_cli={default_level},flowmark_diagram={default_level},flowmark_codec={default_level}"
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting flowmark v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        tracing::error!("flowmark failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = match &cli.settings {
        Some(path) => CodecSettings::load(path)?,
        None => CodecSettings::default(),
    };

    match cli.command {
        Command::Check { file } => check(&file, &settings),
        Command::Convert { input, output, tree } => {
            let (diagram, from) = load_any(&read(&input)?, &settings)?;
            let to = layout(tree);
            DiagramCodec::new(to, &settings).save_file(&diagram, &output)?;
            tracing::info!(from = ?from, to = ?to, "converted {} to {}", input.display(), output.display());
            Ok(())
        }
        Command::Sample { output, tree } => {
            let diagram = share_value(sample()?);
            DiagramCodec::new(layout(tree), &settings).save_file(&diagram, &output)?;
            Ok(())
        }
        Command::Settings => {
            println!("{}", settings.to_ron()?);
            Ok(())
        }
    }
}

fn layout(tree: bool) -> Layout {
    if tree {
        Layout::Tree
    } else {
        Layout::Flat
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn check(file: &Path, settings: &CodecSettings) -> Result<(), CliError> {
    let (diagram, layout) = load_any(&read(file)?, settings)?;
    let Some((name, stats, forest, losses)) =
        FlowDiagram::inspect(&diagram, |d| (d.name.clone(), d.stats(), d.is_forest(), d.tree_losses()))
    else {
        return Err(DiagramError::NotADiagram.into());
    };

    println!("{}: \"{name}\" ({layout:?} layout)", file.display());
    println!("  nodes:    {}", stats.nodes);
    println!("  links:    {}", stats.links);
    println!("  groups:   {}", stats.groups);
    println!("  comments: {}", stats.comments);
    if !forest {
        println!("  tree layout: not possible");
    } else if losses.is_empty() {
        println!("  tree layout: possible");
    } else {
        println!(
            "  tree layout: possible, drops {} group(s) and the styling of {} link(s)",
            losses.groups, losses.styled_links
        );
    }
    Ok(())
}

//! # hl7-cli
//!
//! Command-line front end for the HL7v2 schema compiler.
//!
//! Loads versioned specification documents, compiles message types into
//! group trees and follow sets, and prints the result as JSON or YAML.

mod config;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::Settings;
use hl7_grammar::MessageCompiler;
use hl7_schema::{Specification, SpecificationLoader};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hl7c")]
#[command(about = "HL7v2 schema compiler")]
#[command(version)]
struct Cli {
    /// Path to settings file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile message types into group trees and follow sets
    Compile {
        #[command(flatten)]
        source: SourceArgs,

        /// Compile only this message type (e.g., ADT_A01)
        #[arg(short, long)]
        message: Option<String>,

        /// Also compile message subtypes on their own
        #[arg(long)]
        include_subtypes: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Print the merged follow-set map, or the follow set of one element
    FollowSets {
        #[command(flatten)]
        source: SourceArgs,

        /// Element key (e.g., ADT_A01.pid)
        #[arg(short, long)]
        key: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

/// Specification documents and loader overrides
#[derive(Args)]
struct SourceArgs {
    /// Specification documents, one per version
    #[arg(required = true)]
    documents: Vec<PathBuf>,

    /// Documents with synthetic definitions
    #[arg(short, long)]
    extra: Vec<PathBuf>,

    /// Highest version to load (e.g., 251 for 2.5.1)
    #[arg(long)]
    max_version: Option<u32>,

    /// Definition names to skip
    #[arg(long = "block-list")]
    block_list: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Compile {
            source,
            message,
            include_subtypes,
            format,
        } => {
            if include_subtypes {
                settings.compiler.include_subtypes = true;
            }
            let spec = load(&source, &mut settings)?;
            let compiler = MessageCompiler::with_config(&spec, settings.compiler);

            match message {
                Some(name) => {
                    tracing::info!("Compiling {}", name);
                    let compiled = compiler.compile_named(&name)?;
                    print(&compiled, format)?;
                }
                None => {
                    let compilation = compiler.compile_all()?;
                    print(&compilation, format)?;
                }
            }
        }
        Commands::FollowSets { source, key, format } => {
            let spec = load(&source, &mut settings)?;
            let compilation = MessageCompiler::with_config(&spec, settings.compiler).compile_all()?;

            match key {
                Some(key) => match compilation.follow_sets.get(&key) {
                    Some(set) => print(set, format)?,
                    None => bail!("No follow set for key '{}'", key),
                },
                None => print(&compilation.follow_sets, format)?,
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load(source: &SourceArgs, settings: &mut Settings) -> anyhow::Result<Specification> {
    settings.override_loader(source.max_version, &source.block_list);
    let loader = SpecificationLoader::new(settings.loader.clone());
    loader
        .load_files(&source.documents, &source.extra)
        .context("Failed to load specification")
}

fn print<T: Serialize>(value: &T, format: Format) -> anyhow::Result<()> {
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

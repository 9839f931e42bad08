//! hapconf - formatter and checker for HAProxy configuration files
//!
//! This is the main entry point for the hapconf CLI.

use anyhow::Context;
use ariadne::{Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use hapconf_config::{Config, FormatOptions, ParseError};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// hapconf - keep HAProxy configuration files tidy
#[derive(Parser)]
#[command(name = "hapconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a configuration file in canonical form
    Fmt {
        /// Path to the configuration file
        #[arg(default_value = "haproxy.cfg")]
        config: PathBuf,

        /// Rewrite the file in place instead of printing it
        #[arg(short, long, conflicts_with = "check")]
        write: bool,

        /// Exit with an error if the file is not already formatted
        #[arg(long)]
        check: bool,

        /// TOML file with printer settings
        #[arg(long)]
        style: Option<PathBuf>,
    },

    /// Parse a configuration file and report structural errors
    Check {
        /// Path to the configuration file
        #[arg(default_value = "haproxy.cfg")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Fmt {
            config,
            write,
            check,
            style,
        } => {
            let options = match style {
                Some(path) => FormatOptions::load(&path)
                    .with_context(|| format!("loading style from {}", path.display()))?,
                None => FormatOptions::default(),
            };

            let source = hapconf_core::load_config(&config)?;
            let parsed = match Config::parse(&source) {
                Ok(parsed) => parsed,
                Err(e) => {
                    report_parse_error(&config, &source, &e);
                    std::process::exit(1);
                }
            };
            let formatted = parsed.pretty_print(&options);

            if check {
                if formatted != source {
                    eprintln!("❌ '{}' is not formatted", config.display());
                    std::process::exit(1);
                }
                println!("✅ '{}' is formatted", config.display());
            } else if write {
                if formatted == source {
                    tracing::debug!(path = %config.display(), "already formatted");
                } else {
                    parsed.save_to_file(&config, &options)?;
                }
                println!("✨ Formatted '{}'", config.display());
            } else {
                print!("{formatted}");
            }
        }

        Commands::Check { config } => {
            tracing::info!("Checking config: {}", config.display());

            let source = hapconf_core::load_config(&config)?;
            match Config::parse(&source) {
                Ok(parsed) => {
                    println!("✅ Configuration '{}' is valid!", config.display());
                    println!(
                        "   {} proxies, {} userlists, {} resolvers",
                        parsed.proxies().count(),
                        parsed.userlists().count(),
                        parsed.all_resolvers().count()
                    );
                }
                Err(e) => {
                    report_parse_error(&config, &source, &e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("hapconf v{}", hapconf_core::VERSION);
            println!("Built with ❤️ in Rust");
        }
    }

    Ok(())
}

/// Render a parse error against the offending line
fn report_parse_error(path: &Path, source: &str, error: &ParseError) {
    let name = path.display().to_string();
    let span = line_span(source, error.position());

    let printed = Report::build(ReportKind::Error, (name.as_str(), span.clone()))
        .with_message("❌ Configuration Error")
        .with_label(Label::new((name.as_str(), span)).with_message(error.to_string()))
        .finish()
        .eprint((name.as_str(), Source::from(source)));

    if printed.is_err() {
        eprintln!("❌ Configuration Error: {error}");
    }
}

/// Byte range of the line starting at `position`
fn line_span(source: &str, position: usize) -> Range<usize> {
    let start = position.min(source.len());
    let end = source[start..]
        .find(['\r', '\n'])
        .map_or(source.len(), |offset| start + offset);
    start..end
}

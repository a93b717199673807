//! Command-line interface for the `anatomy` binary.
//!
//! The binary is a thin shell over the library, meant for pipeline debugging and for
//! scripts that need a publish path without embedding the library:
//!
//! - `resolve` - compute a full publish context (version, paths, transfers) from settings
//! - `format` - fill one template string with JSON data
//! - `settings` - print the effective merged settings
//!
//! ```bash
//! anatomy settings --settings-dir ./defaults --overrides ./projects/demo.json --subkey anatomy
//! anatomy format "{asset}/v{version:0>3}" --data '{"asset": "bob", "version": 7}'
//! anatomy resolve --settings-dir ./defaults --project demo --code dm --asset bob \
//!     --subset modelMain --family model --existing 1 --existing 2 --format json
//! ```
//!
//! Logging goes to stderr so JSON output on stdout stays parseable. `--verbose` enables
//! debug logs, `--quiet` disables them, otherwise `RUST_LOG` or `warn` applies.

pub mod format;
pub mod resolve;
pub mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Output format of commands that print structured results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Top-level CLI of the `anatomy` binary.
#[derive(Parser)]
#[command(
    name = "anatomy",
    about = "Resolve publish paths, versions and transfers from studio anatomy settings",
    version,
    long_about = "anatomy computes where a published file goes: it merges studio and project settings, \
                  resolves the next version, fills path templates and plans resource transfers."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the publish context of one subset
    Resolve(resolve::ResolveCommand),

    /// Fill a template string with JSON data
    Format(format::FormatCommand),

    /// Print effective merged settings
    Settings(settings::SettingsCommand),
}

impl Cli {
    /// Initialise logging and run the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error; the binary turns it into a user-facing message.
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_filter());

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(),
            Commands::Format(cmd) => cmd.execute(),
            Commands::Settings(cmd) => cmd.execute(),
        }
    }

    /// Log filter for the global flags, `None` when logging is off.
    fn log_filter(&self) -> Option<EnvFilter> {
        if self.quiet {
            None
        } else if self.verbose {
            Some(EnvFilter::new("anatomy_cli=debug"))
        } else {
            Some(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        }
    }
}

fn init_logging(filter: Option<EnvFilter>) {
    let Some(filter) = filter else {
        return;
    };
    // A subscriber may already be installed when running inside tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

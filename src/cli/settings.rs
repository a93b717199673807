//! `anatomy settings`: print effective merged settings.

use crate::settings::SettingsSource;
use anyhow::Result;
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

/// Merge studio defaults with override documents and print the result as JSON.
#[derive(Args, Debug)]
pub struct SettingsCommand {
    /// Directory tree of studio default documents
    #[arg(long, value_name = "DIR")]
    pub settings_dir: PathBuf,

    /// Override document applied on top, in the order given
    #[arg(long = "overrides", value_name = "FILE")]
    pub overrides: Vec<PathBuf>,

    /// Nested key to print instead of the whole document (repeatable: `--subkey anatomy --subkey templates`)
    #[arg(long = "subkey", value_name = "KEY")]
    pub subkeys: Vec<String>,
}

impl SettingsCommand {
    /// Print the effective settings.
    ///
    /// # Errors
    ///
    /// Fails when the defaults directory cannot be walked.
    pub fn execute(self) -> Result<()> {
        let settings = self.load()?;
        println!("{}", serde_json::to_string_pretty(&settings)?);
        Ok(())
    }

    /// The effective settings without printing them.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn load(&self) -> Result<Value> {
        source(&self.settings_dir, &self.overrides).with_subkeys(self.subkeys.iter().cloned()).load()
    }
}

/// A settings source reading `settings_dir` with `overrides` applied in order.
pub(crate) fn source(settings_dir: &std::path::Path, overrides: &[PathBuf]) -> SettingsSource {
    overrides
        .iter()
        .fold(SettingsSource::new(settings_dir), |source, path| source.with_override_file(path.clone()))
}

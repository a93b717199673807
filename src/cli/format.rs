//! `anatomy format`: fill one template string.

use crate::settings::read_document;
use crate::template::StringTemplate;
use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::Path;

/// Fill a template with data given inline or as a JSON/YAML file.
#[derive(Args, Debug)]
pub struct FormatCommand {
    /// Template string, e.g. `{root}/{asset}/v{version:0>3}`
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Template data: a JSON object, or the path of a JSON/YAML document
    #[arg(long, value_name = "JSON")]
    pub data: String,

    /// Fail unless every key is present and valid
    #[arg(long)]
    pub strict: bool,
}

impl FormatCommand {
    /// Print the filled template.
    ///
    /// In non-strict mode placeholders with missing keys stay in the output and are
    /// listed on stderr.
    ///
    /// # Errors
    ///
    /// Unreadable data, a non-object data document, a value that cannot be written into
    /// a path, or (with `--strict`) a missing key.
    pub fn execute(self) -> Result<()> {
        let output = self.render()?;
        println!("{output}");
        Ok(())
    }

    /// The filled template without printing it.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn render(&self) -> Result<String> {
        let data = parse_data(&self.data)?;
        let template = StringTemplate::new(self.template.as_str());

        if self.strict {
            return Ok(template.format_strict(&data)?.output);
        }

        let result = template.format(&data);
        result.validate_values()?;
        if !result.missing_keys.is_empty() {
            eprintln!("{} missing keys: {}", "⚠".yellow(), result.missing_keys.join(", "));
        }
        Ok(result.output)
    }
}

/// Parse `--data`: inline JSON when it looks like an object, otherwise a document path.
pub(crate) fn parse_data(raw: &str) -> Result<Map<String, Value>> {
    let value = if raw.trim_start().starts_with('{') {
        serde_json::from_str(raw).context("Failed to parse --data as JSON")?
    } else {
        read_document(Path::new(raw))?
    };

    match value {
        Value::Object(map) => Ok(map),
        other => bail!("Template data must be a JSON object, got {}", crate::template::value_type_name(&other)),
    }
}

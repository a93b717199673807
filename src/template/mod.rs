//! Path template formatting for the anatomy.
//!
//! Templates are plain strings with placeholders filled from a nested data mapping:
//!
//! ```text
//! {root[work]}/{project[name]}/{hierarchy}/{asset}/publish/{family}/{subset}/v{version:0>3}/{subset}<_{output}>.{representation}
//! ```
//!
//! # Syntax
//!
//! - `{key}` - value of `key` in the data
//! - `{key[sub][subsub]}` - value nested in objects (`data["key"]["sub"]["subsub"]`)
//! - `{key:spec}` - value formatted with a [`FormatSpec`] (`{version:0>3}` → `001`)
//! - `<...>` - optional segment, dropped entirely when any key inside it is missing or
//!   has an unsupported value; segments may nest
//! - `{@name}` - link to another template of the same [`TemplateSet`], solved before
//!   formatting (see [`solve_template_links`])
//!
//! Only strings and numbers can be written into a path. Objects, lists, booleans and
//! `null` are reported as invalid values.
//!
//! # Strict and partial formatting
//!
//! [`StringTemplate::format`] never fails: it returns a [`TemplateResult`] describing what
//! was solved. Unsolved required placeholders are left verbatim in the output, so
//! formatting the output again with more data gives the same string as formatting the
//! original template once with all the data. This only holds for templates without
//! optional segments and for values without `{`, `}`, `<` or `>`: an optional segment
//! whose key is still missing is dropped in the first pass and cannot come back.
//! [`format_template`] turns the result into either a string or an error depending on
//! `allow_partial`.
//!
//! # Examples
//!
//! ```rust
//! use anatomy_cli::template::format_template;
//! use serde_json::json;
//!
//! let data = json!({"project": {"name": "demo"}, "asset": "bob", "version": 1});
//! let data = data.as_object().unwrap();
//!
//! let partial = format_template("{project[name]}/{asset}/v{version:0>3}/{subset}", data, true)?;
//! assert_eq!(partial, "demo/bob/v001/{subset}");
//!
//! let strict = format_template("{project[name]}/{subset}", data, false);
//! assert!(strict.is_err());
//! # Ok::<(), anatomy_cli::core::AnatomyError>(())
//! ```

pub mod format_spec;
pub mod links;
pub mod set;

pub use format_spec::FormatSpec;
pub use links::solve_template_links;
pub use set::TemplateSet;

use crate::core::{AnatomyError, Result};
use crate::settings::subkey_merge;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A placeholder such as `{project[name]:0>3}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    /// Text of the placeholder including braces, written back when unsolved
    raw: String,
    /// Key path, e.g. `["project", "name"]`
    path: Vec<String>,
    spec: Option<String>,
}

impl Placeholder {
    fn parse(raw: &str) -> Option<Self> {
        let inner = raw.strip_prefix('{')?.strip_suffix('}')?;
        let (field, spec) = match inner.split_once(':') {
            Some((field, spec)) => (field, Some(spec.to_string())),
            None => (inner, None),
        };
        if field.is_empty() {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            path: split_key_path(field),
            spec,
        })
    }

    fn display_key(&self, depth: usize) -> String {
        display_key_path(&self.path[..depth.min(self.path.len())])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Key(Placeholder),
    Optional(Vec<TemplatePart>),
}

enum Token {
    Text(String),
    Key(Placeholder),
    Open,
    Close,
}

/// A key whose value cannot be written into a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    /// Key in `key[sub]` notation
    pub key: String,
    /// What was found instead (JSON type name, or the rejected format spec)
    pub found: String,
}

/// Outcome of formatting a [`StringTemplate`].
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateResult {
    /// Formatted string; unsolved required placeholders are kept verbatim
    pub output: String,
    /// The template that was formatted
    pub template: String,
    /// `true` when every required placeholder was filled
    pub solved: bool,
    /// Missing required keys, in order of first appearance
    pub missing_keys: Vec<String>,
    /// Missing keys of optional segments that were dropped
    pub missing_optional_keys: Vec<String>,
    /// Required keys with unsupported values
    pub invalid_types: Vec<InvalidValue>,
    /// Optional-segment keys with unsupported values
    pub invalid_optional_types: Vec<InvalidValue>,
    /// The data values actually written into the output, nested like the input data
    pub used_values: Map<String, Value>,
}

impl TemplateResult {
    /// Fail when the template was not fully solved.
    ///
    /// Invalid values are reported before missing keys.
    ///
    /// # Errors
    ///
    /// [`AnatomyError::InvalidTemplateValue`] for the first invalid value, otherwise
    /// [`AnatomyError::MissingTemplateKey`] for the first missing key.
    pub fn validate(&self) -> Result<()> {
        self.validate_values()?;
        if let Some(key) = self.missing_keys.first() {
            return Err(AnatomyError::MissingTemplateKey {
                key: key.clone(),
                template: self.template.clone(),
            });
        }
        Ok(())
    }

    /// Fail on values that cannot be written into a path; missing keys are allowed.
    ///
    /// # Errors
    ///
    /// [`AnatomyError::InvalidTemplateValue`] for the first invalid value.
    pub fn validate_values(&self) -> Result<()> {
        match self.invalid_types.first() {
            Some(invalid) => Err(AnatomyError::InvalidTemplateValue {
                key: invalid.key.clone(),
                template: self.template.clone(),
                found: invalid.found.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for TemplateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}

#[derive(Default)]
struct PartialOutput {
    output: String,
    missing: Vec<String>,
    invalid: Vec<InvalidValue>,
    missing_optional: Vec<String>,
    invalid_optional: Vec<InvalidValue>,
    used: Vec<(Vec<String>, Value)>,
}

impl PartialOutput {
    fn is_solved(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    fn add_missing(&mut self, key: String) {
        if !self.missing.contains(&key) {
            self.missing.push(key);
        }
    }
}

/// A parsed path template.
///
/// Parsing never fails: unbalanced `<`/`>` and unterminated `{` are kept as literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTemplate {
    template: String,
    parts: Vec<TemplatePart>,
}

impl StringTemplate {
    /// Parse a template string.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let parts = build_parts(tokenize(&template));
        Self {
            template,
            parts,
        }
    }

    /// The template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Top-level data keys referenced outside optional segments, in order of appearance.
    #[must_use]
    pub fn required_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for part in &self.parts {
            if let TemplatePart::Key(placeholder) = part {
                let key = placeholder.display_key(1);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Fill the template from `data`.
    ///
    /// Missing required keys stay verbatim in the output so it can be formatted again
    /// later. Optional segments are decided here: without `b`, `{a}<_{b}>` loses its
    /// `<_{b}>` segment and filling `b` afterwards does not restore it.
    #[must_use]
    pub fn format(&self, data: &Map<String, Value>) -> TemplateResult {
        let mut partial = PartialOutput::default();
        format_parts(&self.parts, data, &mut partial);

        let mut used_values = Map::new();
        for (path, value) in partial.used {
            subkey_merge(&mut used_values, value, &path);
        }

        TemplateResult {
            solved: partial.missing.is_empty() && partial.invalid.is_empty(),
            output: partial.output,
            template: self.template.clone(),
            missing_keys: partial.missing,
            missing_optional_keys: partial.missing_optional,
            invalid_types: partial.invalid,
            invalid_optional_types: partial.invalid_optional,
            used_values,
        }
    }

    /// Fill the template and fail unless every required placeholder was solved.
    ///
    /// # Errors
    ///
    /// See [`TemplateResult::validate`].
    pub fn format_strict(&self, data: &Map<String, Value>) -> Result<TemplateResult> {
        let result = self.format(data);
        result.validate()?;
        Ok(result)
    }
}

impl FromStr for StringTemplate {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for StringTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Format `template` with `data` in strict or partial mode.
///
/// - Partial (`allow_partial = true`): placeholders whose keys are missing stay verbatim
/// - Strict: the first missing key fails with [`AnatomyError::MissingTemplateKey`]
///
/// In both modes a value that cannot be written into a path (object, list, boolean,
/// `null`, or a value rejected by its format spec) fails with
/// [`AnatomyError::InvalidTemplateValue`].
///
/// # Errors
///
/// See above.
pub fn format_template(template: &str, data: &Map<String, Value>, allow_partial: bool) -> Result<String> {
    let result = StringTemplate::new(template).format(data);
    if allow_partial {
        result.validate_values()?;
    } else {
        result.validate()?;
    }
    Ok(result.output)
}

/// JSON type name used in invalid-value reports.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn format_parts(parts: &[TemplatePart], data: &Map<String, Value>, out: &mut PartialOutput) {
    for part in parts {
        match part {
            TemplatePart::Literal(text) => out.output.push_str(text),
            TemplatePart::Key(placeholder) => format_placeholder(placeholder, data, out),
            TemplatePart::Optional(inner) => {
                let mut nested = PartialOutput::default();
                format_parts(inner, data, &mut nested);

                if nested.is_solved() {
                    out.output.push_str(&nested.output);
                    out.used.extend(nested.used);
                }
                for key in nested.missing.into_iter().chain(nested.missing_optional) {
                    if !out.missing_optional.contains(&key) {
                        out.missing_optional.push(key);
                    }
                }
                out.invalid_optional.extend(nested.invalid.into_iter().chain(nested.invalid_optional));
            }
        }
    }
}

fn format_placeholder(placeholder: &Placeholder, data: &Map<String, Value>, out: &mut PartialOutput) {
    let mut current = data;
    let last = placeholder.path.len() - 1;

    for (depth, segment) in placeholder.path.iter().enumerate() {
        let Some(value) = current.get(segment) else {
            out.add_missing(placeholder.display_key(depth + 1));
            out.output.push_str(&placeholder.raw);
            return;
        };

        if depth < last {
            if let Value::Object(next) = value {
                current = next;
                continue;
            }
            out.invalid.push(InvalidValue {
                key: placeholder.display_key(depth + 1),
                found: value_type_name(value).to_string(),
            });
            out.output.push_str(&placeholder.raw);
            return;
        }

        let spec = match placeholder.spec.as_deref() {
            Some(spec) => FormatSpec::parse(spec),
            None => FormatSpec::parse(""),
        };
        let formatted = spec.as_ref().and_then(|spec| spec.apply(value));
        match formatted {
            Some(text) => {
                out.output.push_str(&text);
                out.used.push((placeholder.path.clone(), value.clone()));
            }
            None => {
                let found = match (&spec, value) {
                    (None, _) => format!("unsupported format spec '{}'", placeholder.spec.as_deref().unwrap_or_default()),
                    (Some(_), Value::String(_) | Value::Number(_)) => format!(
                        "{} for format spec '{}'",
                        value_type_name(value),
                        placeholder.spec.as_deref().unwrap_or_default()
                    ),
                    (Some(_), other) => value_type_name(other).to_string(),
                };
                out.invalid.push(InvalidValue {
                    key: placeholder.display_key(placeholder.path.len()),
                    found,
                });
                out.output.push_str(&placeholder.raw);
            }
        }
        return;
    }
}

/// Split `project[name][code]` into `["project", "name", "code"]`.
///
/// A field that does not follow the bracket syntax is used as a single key.
fn split_key_path(field: &str) -> Vec<String> {
    let Some(open) = field.find('[') else {
        return vec![field.to_string()];
    };

    let mut path = vec![field[..open].to_string()];
    let mut rest = &field[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return vec![field.to_string()];
        };
        let segment = &stripped[..close];
        if segment.is_empty() || segment.contains('[') {
            return vec![field.to_string()];
        }
        path.push(segment.to_string());
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() || path[0].is_empty() {
        return vec![field.to_string()];
    }
    path
}

pub(crate) fn display_key_path(path: &[String]) -> String {
    let mut key = path.first().cloned().unwrap_or_default();
    for segment in path.iter().skip(1) {
        key.push('[');
        key.push_str(segment);
        key.push(']');
    }
    key
}

fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '{' => {
                let placeholder = rest
                    .find('}')
                    .map(|end| &rest[..=end])
                    .filter(|raw| !raw[1..].contains('{'))
                    .and_then(Placeholder::parse);
                if let Some(placeholder) = placeholder {
                    if !text.is_empty() {
                        tokens.push(Token::Text(std::mem::take(&mut text)));
                    }
                    rest = &rest[placeholder.raw.len()..];
                    tokens.push(Token::Key(placeholder));
                    continue;
                }
                text.push(ch);
            }
            '<' | '>' => {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(if ch == '<' { Token::Open } else { Token::Close });
            }
            _ => text.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }

    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

fn build_parts(tokens: Vec<Token>) -> Vec<TemplatePart> {
    let mut stack: Vec<Vec<TemplatePart>> = vec![Vec::new()];

    for token in tokens {
        match token {
            Token::Open => stack.push(Vec::new()),
            Token::Close if stack.len() > 1 => {
                let inner = stack.pop().unwrap_or_default();
                push_part(&mut stack, TemplatePart::Optional(inner));
            }
            Token::Close => push_part(&mut stack, TemplatePart::Literal(">".to_string())),
            Token::Text(text) => push_part(&mut stack, TemplatePart::Literal(text)),
            Token::Key(placeholder) => push_part(&mut stack, TemplatePart::Key(placeholder)),
        }
    }

    // Unclosed optional segments are plain text
    while stack.len() > 1 {
        let unclosed = stack.pop().unwrap_or_default();
        push_part(&mut stack, TemplatePart::Literal("<".to_string()));
        for part in unclosed {
            push_part(&mut stack, part);
        }
    }
    stack.pop().unwrap_or_default()
}

fn push_part(stack: &mut [Vec<TemplatePart>], part: TemplatePart) {
    let Some(parts) = stack.last_mut() else {
        return;
    };
    if let (Some(TemplatePart::Literal(previous)), TemplatePart::Literal(text)) = (parts.last_mut(), &part) {
        previous.push_str(text);
        return;
    }
    parts.push(part);
}

//! Format specs inside placeholders.
//!
//! The part after `:` in `{version:0>3}` or `{frame:04d}` follows the familiar
//! `[[fill]align][sign][0][width][.precision][type]` mini-language. Supported types are
//! `d` (integer), `f` (fixed-point float) and `s` (string); without a type any string or
//! number is accepted.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn spec_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(?:(?P<fill>.)?(?P<align>[<>=^]))?(?P<sign>[-+ ])?(?P<zero>0)?(?P<width>\d+)?(?:\.(?P<precision>\d+))?(?P<type>[dfs])?$",
            )
            .ok()
        })
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

/// A parsed format spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    fill: char,
    align: Option<Align>,
    sign: Option<char>,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

enum Formattable<'a> {
    Str(&'a str),
    Int(i128),
    Float(f64),
}

impl FormatSpec {
    /// Parse a spec string; `None` when it does not follow the mini-language.
    ///
    /// ```rust
    /// use anatomy_cli::template::FormatSpec;
    /// use serde_json::json;
    ///
    /// let spec = FormatSpec::parse("0>3").unwrap();
    /// assert_eq!(spec.apply(&json!(7)).as_deref(), Some("007"));
    /// ```
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let captures = spec_pattern()?.captures(spec)?;

        let mut fill = captures.name("fill").and_then(|m| m.as_str().chars().next()).unwrap_or(' ');
        let mut align = captures.name("align").map(|m| match m.as_str() {
            "<" => Align::Left,
            ">" => Align::Right,
            "^" => Align::Center,
            _ => Align::AfterSign,
        });
        if captures.name("zero").is_some() && align.is_none() {
            fill = '0';
            align = Some(Align::AfterSign);
        }

        Some(Self {
            fill,
            align,
            sign: captures.name("sign").and_then(|m| m.as_str().chars().next()),
            width: captures.name("width").and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
            precision: captures.name("precision").and_then(|m| m.as_str().parse().ok()),
            kind: captures.name("type").and_then(|m| m.as_str().chars().next()),
        })
    }

    /// Format `value`, or `None` when the value type does not fit the spec
    /// (e.g. a string with `d`, or a list).
    #[must_use]
    pub fn apply(&self, value: &Value) -> Option<String> {
        let formattable = match value {
            Value::String(s) => Formattable::Str(s),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Formattable::Int(i128::from(i)),
                (None, Some(u)) => Formattable::Int(i128::from(u)),
                (None, None) => Formattable::Float(n.as_f64()?),
            },
            _ => return None,
        };

        match formattable {
            Formattable::Str(s) => self.format_str(s),
            Formattable::Int(i) => self.format_int(i),
            Formattable::Float(f) => self.format_float(f),
        }
    }

    fn format_str(&self, value: &str) -> Option<String> {
        if !matches!(self.kind, None | Some('s')) || self.sign.is_some() {
            return None;
        }
        let align = match self.align {
            Some(Align::AfterSign) if self.fill == '0' => Align::Left,
            Some(Align::AfterSign) => return None,
            Some(align) => align,
            None => Align::Left,
        };
        let body: String = match self.precision {
            Some(precision) => value.chars().take(precision).collect(),
            None => value.to_string(),
        };
        Some(self.pad("", &body, align))
    }

    fn format_int(&self, value: i128) -> Option<String> {
        match self.kind {
            None | Some('d') if self.precision.is_none() => {
                let body = value.unsigned_abs().to_string();
                Some(self.pad(self.sign_for(value < 0), &body, self.number_align()))
            }
            #[allow(clippy::cast_precision_loss)]
            Some('f') => self.format_float(value as f64),
            _ => None,
        }
    }

    fn format_float(&self, value: f64) -> Option<String> {
        let body = match (self.kind, self.precision) {
            (Some('f'), precision) => format!("{:.*}", precision.unwrap_or(6), value.abs()),
            (None, Some(precision)) => format!("{:.*}", precision, value.abs()),
            (None, None) => {
                let plain = value.abs().to_string();
                if plain.contains('.') || plain.contains('e') || !value.is_finite() {
                    plain
                } else {
                    format!("{plain}.0")
                }
            }
            _ => return None,
        };
        Some(self.pad(self.sign_for(value.is_sign_negative() && value != 0.0), &body, self.number_align()))
    }

    fn number_align(&self) -> Align {
        self.align.unwrap_or(Align::Right)
    }

    fn sign_for(&self, negative: bool) -> &'static str {
        match (negative, self.sign) {
            (true, _) => "-",
            (false, Some('+')) => "+",
            (false, Some(' ')) => " ",
            _ => "",
        }
    }

    fn pad(&self, sign: &str, body: &str, align: Align) -> String {
        let len = sign.chars().count() + body.chars().count();
        let padding = self.width.saturating_sub(len);
        let fill = |n: usize| self.fill.to_string().repeat(n);

        match align {
            Align::Left => format!("{sign}{body}{}", fill(padding)),
            Align::Right => format!("{}{sign}{body}", fill(padding)),
            Align::Center => {
                let left = padding / 2;
                format!("{}{sign}{body}{}", fill(left), fill(padding - left))
            }
            Align::AfterSign => format!("{sign}{}{body}", fill(padding)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fmt(spec: &str, value: Value) -> Option<String> {
        FormatSpec::parse(spec).and_then(|s| s.apply(&value))
    }

    #[test]
    fn test_version_padding() {
        assert_eq!(fmt("0>3", json!(1)).as_deref(), Some("001"));
        assert_eq!(fmt("0>3", json!(1234)).as_deref(), Some("1234"));
        assert_eq!(fmt("03d", json!(12)).as_deref(), Some("012"));
        assert_eq!(fmt("04d", json!(-5)).as_deref(), Some("-005"));
    }

    #[test]
    fn test_alignment_and_fill() {
        assert_eq!(fmt("<5", json!("ab")).as_deref(), Some("ab   "));
        assert_eq!(fmt(">5", json!("ab")).as_deref(), Some("   ab"));
        assert_eq!(fmt("*^6", json!("ab")).as_deref(), Some("**ab**"));
        assert_eq!(fmt("5", json!(42)).as_deref(), Some("   42"));
        assert_eq!(fmt("5", json!("ab")).as_deref(), Some("ab   "));
    }

    #[test]
    fn test_sign_and_float() {
        assert_eq!(fmt("+d", json!(3)).as_deref(), Some("+3"));
        assert_eq!(fmt(".2f", json!(3.14159)).as_deref(), Some("3.14"));
        assert_eq!(fmt("f", json!(2)).as_deref(), Some("2.000000"));
        assert_eq!(fmt("", json!(1.5)).as_deref(), Some("1.5"));
    }

    #[test]
    fn test_string_precision_truncates() {
        assert_eq!(fmt(".3", json!("modelMain")).as_deref(), Some("mod"));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        assert_eq!(fmt("d", json!("abc")), None);
        assert_eq!(fmt("s", json!(1)), None);
        assert_eq!(fmt("d", json!(1.5)), None);
        assert_eq!(fmt("", json!(true)), None);
        assert_eq!(fmt("", json!(["a"])), None);
    }

    #[test]
    fn test_unparsable_spec() {
        assert_eq!(FormatSpec::parse("0>3x"), None);
        assert_eq!(FormatSpec::parse("abc"), None);
    }
}

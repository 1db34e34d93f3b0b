use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

const MAX_SLUG_CHARS: usize = 120;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

// Letters, numbers and `_` only; `\w` would also keep combining marks and ZWJ
fn non_slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}_\s\-]+").expect("valid regex"))
}

fn decimal_digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\p{Nd}+$").expect("valid regex"))
}

/// NFKC-normalize, turn zero-width joiners and direction marks into spaces,
/// collapse whitespace and trim.
pub fn normalize_text(s: &str) -> String {
    let composed: String = s
        .nfkc()
        .map(|c| match c {
            '\u{200c}' | '\u{200e}' | '\u{200f}' => ' ',
            other => other,
        })
        .collect();
    whitespace_re().replace_all(&composed, " ").trim().to_string()
}

/// File-system safe name derived from an industry name
pub fn slugify(text: &str) -> String {
    let text = normalize_text(text);
    let text = non_slug_re().replace_all(&text, "");
    let text = whitespace_re().replace_all(&text, "_");
    if text.is_empty() {
        return "unknown".to_string();
    }
    text.chars().take(MAX_SLUG_CHARS).collect()
}

/// First key present in `obj` whose value is not null
pub fn first_key<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Text form of a scalar JSON value; strings are taken verbatim
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Industry codes are two-digit strings; "1" and "01" name the same group.
/// Persian and Arabic-Indic digits count as digits and get an ASCII `0`.
pub fn pad_industry_code(code: &str) -> String {
    let code = code.trim();
    if decimal_digits_re().is_match(code) && code.chars().count() < 2 {
        format!("{:0>2}", code)
    } else {
        code.to_string()
    }
}

//! Tag resolution for plain (unquoted, untagged) scalars.
//!
//! Follows the YAML 1.1-flavored core schema: `0o17` and `017` are both
//! octal integers, `y`-less booleans only (`true`/`True`/`TRUE`), and
//! ISO-8601-shaped values resolve to `!!timestamp`.
//!
//! One consequence worth spelling out: a digit string with a leading zero
//! that is not valid octal, such as `01289`, is not an integer. It still
//! parses as a floating point number and therefore resolves to `!!float`.

use std::sync::OnceLock;

use regex::Regex;

use crate::node::long_tag;

/// Resolve the tag of a plain scalar with no explicit tag.
///
/// Returns the long form of the tag (e.g. `tag:yaml.org,2002:int`).
///
/// ```
/// use cueyaml_parser::resolve_plain_tag;
///
/// assert_eq!(resolve_plain_tag("017"), "tag:yaml.org,2002:int");
/// assert_eq!(resolve_plain_tag("01289"), "tag:yaml.org,2002:float");
/// assert_eq!(resolve_plain_tag("<<"), "tag:yaml.org,2002:merge");
/// ```
#[must_use]
pub fn resolve_plain_tag(v: &str) -> String {
    long_tag(resolve_short(v))
}

fn resolve_short(v: &str) -> &'static str {
    match v {
        "" | "~" | "null" | "Null" | "NULL" => return "!!null",
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => return "!!bool",
        "<<" => return "!!merge",
        _ => {}
    }
    let signless = v
        .strip_prefix('+')
        .or_else(|| v.strip_prefix('-'))
        .unwrap_or(v);
    if matches!(
        signless,
        ".inf" | ".Inf" | ".INF" | ".nan" | ".NaN" | ".NAN"
    ) {
        return "!!float";
    }
    if is_int(v) {
        "!!int"
    } else if is_float(v) {
        "!!float"
    } else if is_timestamp(v) {
        "!!timestamp"
    } else {
        "!!str"
    }
}

/// Check a digit run possibly containing `_` separators against `valid`.
fn all_digits(s: &str, valid: impl Fn(u8) -> bool) -> bool {
    !s.is_empty()
        && s.bytes().any(|b| b != b'_')
        && s.bytes().all(|b| b == b'_' || valid(b))
}

fn is_int(v: &str) -> bool {
    let v = v.strip_prefix(['-', '+']).unwrap_or(v);
    if let Some(rest) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        return all_digits(rest, |b| b.is_ascii_hexdigit());
    }
    if let Some(rest) = v.strip_prefix("0o") {
        return all_digits(rest, |b| (b'0'..=b'7').contains(&b));
    }
    if let Some(rest) = v.strip_prefix("0b") {
        return all_digits(rest, |b| b == b'0' || b == b'1');
    }
    if v.len() > 1 && v.starts_with('0') {
        // YAML 1.1 octal. `0129` falls through to the float check.
        return all_digits(&v[1..], |b| (b'0'..=b'7').contains(&b));
    }
    all_digits(v, |b| b.is_ascii_digit())
}

fn is_float(v: &str) -> bool {
    let stripped: String = v.chars().filter(|&c| c != '_').collect();
    if !stripped.bytes().any(|b| b.is_ascii_digit()) {
        // Keeps `inf`, `nan` and the empty string out of the float space
        // even though Rust would parse them.
        return false;
    }
    let body = stripped.strip_prefix(['-', '+']).unwrap_or(&stripped);
    if body.bytes().next().is_some_and(|b| !b.is_ascii_digit() && b != b'.') {
        return false;
    }
    stripped.parse::<f64>().is_ok()
}

fn is_timestamp(v: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"^\d{4}-\d\d?-\d\d?(([Tt]|[ \t]+)\d\d?:\d\d:\d\d(\.\d*)?([ \t]*(Z|[-+]\d\d?(:\d\d)?))?)?$",
        )
        .expect("timestamp pattern is valid")
    });
    re.is_match(v)
}

#[cfg(test)]
mod test {
    use super::resolve_plain_tag;

    fn short(v: &str) -> String {
        resolve_plain_tag(v)
            .strip_prefix("tag:yaml.org,2002:")
            .map(|s| format!("!!{s}"))
            .unwrap_or_default()
    }

    #[test]
    fn test_null_bool() {
        assert_eq!(short(""), "!!null");
        assert_eq!(short("~"), "!!null");
        assert_eq!(short("NULL"), "!!null");
        assert_eq!(short("True"), "!!bool");
        assert_eq!(short("false"), "!!bool");
        // YAML 1.2 dropped `yes`/`no`.
        assert_eq!(short("yes"), "!!str");
    }

    #[test]
    fn test_int() {
        assert_eq!(short("0"), "!!int");
        assert_eq!(short("-12"), "!!int");
        assert_eq!(short("+12"), "!!int");
        assert_eq!(short("0x1F"), "!!int");
        assert_eq!(short("0o17"), "!!int");
        assert_eq!(short("017"), "!!int");
        assert_eq!(short("0b101"), "!!int");
        assert_eq!(short("62_000"), "!!int");
    }

    #[test]
    fn test_leading_zero_decimal_is_float() {
        assert_eq!(short("01289"), "!!float");
    }

    #[test]
    fn test_float() {
        assert_eq!(short("1.5"), "!!float");
        assert_eq!(short("-2e10"), "!!float");
        assert_eq!(short(".5"), "!!float");
        assert_eq!(short(".inf"), "!!float");
        assert_eq!(short("-.INF"), "!!float");
        assert_eq!(short(".NaN"), "!!float");
        assert_eq!(short("-.nan"), "!!float");
        assert_eq!(short("inf"), "!!str");
        assert_eq!(short("nan"), "!!str");
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(short("2001-12-15"), "!!timestamp");
        assert_eq!(short("2001-12-14 21:59:43.10 -5"), "!!timestamp");
        assert_eq!(short("2001-12-14T21:59:43Z"), "!!timestamp");
        assert_eq!(short("2001-13"), "!!str");
    }

    #[test]
    fn test_merge() {
        assert_eq!(short("<<"), "!!merge");
    }
}

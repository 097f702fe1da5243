//! CUE literal services: quoting strings, bytes and labels, and validating
//! numeric literals.

/// Quote a string as a CUE string literal.
///
/// Strings with interior line breaks that end in a line break are rendered
/// as a multi-line `"""` literal indented with one tab, which is what the
/// formatter expects for block-style text. Everything else becomes a
/// single-line double-quoted literal.
#[must_use]
pub fn quote_str(s: &str) -> String {
    if s.contains('\n') && s.ends_with('\n') {
        return quote_multiline(s);
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        escape_char(c, &mut out);
    }
    out.push('"');
    out
}

fn quote_multiline(s: &str) -> String {
    let mut out = String::from("\"\"\"\n");
    for line in s[..s.len() - 1].split('\n') {
        if !line.is_empty() {
            out.push('\t');
            for c in line.chars() {
                escape_char(c, &mut out);
            }
        }
        out.push('\n');
    }
    out.push_str("\t\"\"\"");
    out
}

fn escape_char(c: char, out: &mut String) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        c if (c as u32) < 0x20 || c == '\u{7f}' => {
            out.push_str(&format!("\\u{:04X}", c as u32));
        }
        c => out.push(c),
    }
}

/// Quote decoded binary data as a CUE bytes literal (`'...'`).
#[must_use]
pub fn quote_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() + 2);
    out.push('\'');
    for &b in data {
        match b {
            b'\'' => out.push_str("\\'"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            b => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

/// CUE keywords that cannot appear as bare labels.
const KEYWORDS: &[&str] = &["true", "false", "null", "for", "in", "if", "let"];

/// Whether `s` can be written as a bare identifier label.
#[must_use]
pub fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }
    !KEYWORDS.contains(&s)
}

/// Facts about a validated numeric literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumInfo {
    /// Whether the literal denotes an integer.
    pub is_int: bool,
}

/// Validate a CUE numeric literal.
///
/// Accepts decimal integers, `0b`/`0o`/`0x` forms, and floating point
/// literals with an optional fraction and exponent. Digit runs may be
/// grouped with `_`.
///
/// # Errors
/// Returns a description of the malformation.
pub fn parse_num(s: &str) -> Result<NumInfo, String> {
    let body = s
        .strip_prefix('+')
        .or_else(|| s.strip_prefix('-'))
        .unwrap_or(s);
    if body.is_empty() {
        return Err("empty number".to_owned());
    }
    for (prefix, desc, valid) in [
        ("0b", "binary", is_bin as fn(u8) -> bool),
        ("0o", "octal", is_oct as fn(u8) -> bool),
        ("0x", "hexadecimal", is_hex as fn(u8) -> bool),
        ("0X", "hexadecimal", is_hex as fn(u8) -> bool),
    ] {
        if let Some(digits) = body.strip_prefix(prefix) {
            return if digit_run(digits, valid) {
                Ok(NumInfo { is_int: true })
            } else {
                Err(format!("invalid digit in {desc} literal"))
            };
        }
    }

    let bytes = body.as_bytes();
    let mut i = 0;
    let int_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
    }
    let int_digits = &body[int_start..i];
    let mut is_int = true;
    if i < bytes.len() && bytes[i] == b'.' {
        is_int = false;
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        is_int = false;
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
        if !body[exp_start..i].bytes().any(|b| b.is_ascii_digit()) {
            return Err("exponent has no digits".to_owned());
        }
    }
    if i < bytes.len() {
        return Err(format!("invalid character {:?} in number", body[i..].chars().next().unwrap_or('?')));
    }
    if !body.bytes().any(|b| b.is_ascii_digit()) {
        return Err("number has no digits".to_owned());
    }
    // Decimal integers must not carry a leading zero.
    if int_digits.len() > 1 && int_digits.starts_with('0') {
        return Err("invalid leading zero in number".to_owned());
    }
    Ok(NumInfo { is_int })
}

fn digit_run(s: &str, valid: fn(u8) -> bool) -> bool {
    !s.is_empty() && s.bytes().any(|b| b != b'_') && s.bytes().all(|b| b == b'_' || valid(b))
}

fn is_bin(b: u8) -> bool {
    b == b'0' || b == b'1'
}

fn is_oct(b: u8) -> bool {
    (b'0'..=b'7').contains(&b)
}

fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

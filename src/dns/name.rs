//! Helpers for domain names in presentation form.
//!
//! Names travel through the crate as absolute strings (`"com."`, `"."`).
//! Comparison is case-insensitive in DNS, so anything that ends up in a set
//! goes through [`normalize`] first.
//!
//! Labels are kept in RFC 1035 5.1 presentation form: a `.` or `\` inside a
//! label is backslash-escaped and bytes outside printable ASCII are written
//! as `\DDD`. Case folding only touches ASCII letters, so `\065` and `a`
//! do not compare equal.

/// Appends the trailing dot if missing. The empty string is the root.
pub fn to_absolute(name: &str) -> String {
    if name.is_empty() {
        ".".to_string()
    } else if ends_with_separator(name) {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Lowercase absolute form.
pub fn normalize(name: &str) -> String {
    to_absolute(name).to_ascii_lowercase()
}

pub fn is_root(name: &str) -> bool {
    name.is_empty() || name == "." || name == "@"
}

/// True if the final `.` is a label separator rather than an escaped dot.
fn ends_with_separator(name: &str) -> bool {
    let Some(body) = name.strip_suffix('.') else {
        return false;
    };
    let backslashes = body.bytes().rev().take_while(|&b| b == b'\\').count();
    backslashes % 2 == 0
}

/// Splits a presentation name into labels, honouring escapes.
pub fn labels_of(name: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in name.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == '.' {
            if !current.is_empty() {
                labels.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        labels.push(current);
    }
    labels
}

/// Presentation form of one label as found on the wire.
pub fn escape_label(raw: &[u8]) -> String {
    let mut label = String::with_capacity(raw.len());
    for &byte in raw {
        match byte {
            b'.' | b'\\' => {
                label.push('\\');
                label.push(byte as char);
            }
            0x21..=0x7E => label.push(byte as char),
            _ => label.push_str(&format!("\\{:03}", byte)),
        }
    }
    label
}

/// Wire bytes of one presentation label, or `None` for a broken escape.
pub fn unescape_label(label: &str) -> Option<Vec<u8>> {
    let mut raw = Vec::with_capacity(label.len());
    let mut bytes = label.bytes();
    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            raw.push(byte);
            continue;
        }
        let first = bytes.next()?;
        if first.is_ascii_digit() {
            let second = bytes.next().filter(u8::is_ascii_digit)?;
            let third = bytes.next().filter(u8::is_ascii_digit)?;
            let value = u16::from(first - b'0') * 100
                + u16::from(second - b'0') * 10
                + u16::from(third - b'0');
            raw.push(u8::try_from(value).ok()?);
        } else {
            raw.push(first);
        }
    }
    Some(raw)
}

pub fn from_labels(labels: &[String]) -> String {
    if labels.is_empty() {
        ".".to_string()
    } else {
        let mut name = labels.join(".");
        name.push('.');
        name
    }
}

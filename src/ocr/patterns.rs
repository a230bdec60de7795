use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::{truncate_raw, ExtractedFields};

// Each list is ordered by reliability: the first pattern that matches wins.

// Either thousands groups (`5,500`, `5 499`, `1.250.000`) or a plain run of
// digits, each with an optional one or two digit decimal part.
const AMOUNT: &str =
    r"\b(\d{1,3}(?:[,.\x20\u{a0}]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?)";

static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        format!(r"(?i)transferred\s+{AMOUNT}\s*XAF"),
        format!(r"(?i)transaction\s+of\s+{AMOUNT}\s*XAF"),
        format!(r"(?i)montant\s*:\s*{AMOUNT}\s*XAF"),
        format!(r"(?i)amount\s*:\s*{AMOUNT}\s*XAF"),
        format!(r"(?i){AMOUNT}\s*XAF\s+transf[ée]r[ée]"),
        format!(r"(?i){AMOUNT}\s*XAF\s+paid"),
    ])
});

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\bto\s+(\p{L}[\p{L} '.\-]*?)\s*\(",
        r"(?i)destinataire\s*:\s*(\p{L}[\p{L} '.\-]*)",
    ])
});

static NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\(\+?(\d{9,12})\)",
        r"(?i)num[ée]ro\s*:\s*\+?(\d{9,12})",
    ])
});

static TIMESTAMP_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})").expect("valid regex"),
            "%Y-%m-%d %H:%M:%S",
        ),
        (
            Regex::new(r"(\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2})").expect("valid regex"),
            "%d/%m/%Y %H:%M",
        ),
    ]
});

static REFERENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)transaction\s+id\s*:\s*([0-9A-Z]+)",
        r"(?i)r[ée]f[ée]rence\s*:\s*([0-9A-Z]+)",
    ])
});

static BALANCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        format!(r"(?i)balance\s*:\s*{AMOUNT}\s*XAF"),
        format!(r"(?i)solde\s*:\s*{AMOUNT}\s*XAF"),
    ])
});

fn compile<S: AsRef<str>>(patterns: &[S]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).expect("valid regex"))
        .collect()
}

fn first_match<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Parse a receipt amount such as `5,500`, `5 500`, `5.500` or `5500.50`.
///
/// A separator followed by one or two digits is a decimal point; the value is
/// rounded half up to whole units. Values that do not fit an `i64` are `None`.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if compact.is_empty() {
        return None;
    }

    let (integer, fraction) = match compact.rfind([',', '.']) {
        Some(pos) => {
            let tail = &compact[pos + 1..];
            if (1..=2).contains(&tail.len()) && tail.chars().all(|c| c.is_ascii_digit()) {
                (&compact[..pos], Some(tail))
            } else {
                (compact.as_str(), None)
            }
        }
        None => (compact.as_str(), None),
    };

    let digits: String = integer.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<i64>().ok()?;
    match fraction.and_then(|f| f.chars().next()).and_then(|c| c.to_digit(10)) {
        Some(first) if first >= 5 => value.checked_add(1),
        _ => Some(value),
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_PATTERNS.iter().find_map(|(re, format)| {
        let found = re.captures(text)?.get(1)?.as_str();
        let normalized = found.split_whitespace().collect::<Vec<_>>().join(" ");
        NaiveDateTime::parse_from_str(&normalized, format).ok()
    })
}

/// Apply the field patterns to recognised receipt text.
pub fn extract_fields(text: &str) -> ExtractedFields {
    ExtractedFields {
        amount: first_match(&AMOUNT_PATTERNS, text).and_then(parse_amount),
        counterparty_name: first_match(&NAME_PATTERNS, text).map(str::to_string),
        counterparty_number: first_match(&NUMBER_PATTERNS, text).map(str::to_string),
        timestamp: parse_timestamp(text),
        transaction_reference: first_match(&REFERENCE_PATTERNS, text).map(str::to_string),
        resulting_balance: first_match(&BALANCE_PATTERNS, text).and_then(parse_amount),
        raw_text: truncate_raw(text),
    }
}

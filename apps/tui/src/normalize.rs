use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical matching form: uppercase, accents stripped, whitespace collapsed.
///
/// Used for category keys and province lookups, so `"Cañar"`, `"canar"` and
/// `" CAÑAR "` all resolve to `"CANAR"`.
pub fn normalize_text(value: &str) -> String {
    let upper = value.to_uppercase();
    let stripped: String = upper.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stands in for Ñ in sort keys so it orders after every N sequence and before O.
const ENYE_KEY: &str = "N\u{10FFFF}";

/// Spanish sort key: the matching form, except that Ñ stays its own letter.
fn collation_key(value: &str) -> String {
    let composed: String = value.to_uppercase().nfc().collect();
    normalize_text(&composed.replace('Ñ', ENYE_KEY))
}

/// Orders labels the Spanish way ignoring case and accents (Ñ sorts after N);
/// exact ties fall back to the raw text.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let mut truncated: String = label.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Formats a count the way the Ecuadorian locale does (`1.234.567`, `12,5`).
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let negative = value < 0.0;
    let scaled = (value.abs() * 1000.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = scaled as u64;
    let whole = scaled / 1000;
    let fraction = scaled % 1000;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    if fraction > 0 {
        let decimals = format!("{fraction:03}");
        grouped.push(',');
        grouped.push_str(decimals.trim_end_matches('0'));
    }

    if negative && (whole > 0 || fraction > 0) {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(String::new, |value| format!("{value:.2}"))
}

// Utility helpers for cell coercion, label matching and number formatting.
//
// This module centralizes the "dirty" spreadsheet value handling so the
// rest of the code can work with typed values.
use crate::config::LoaderConfig;
use crate::types::CellValue;
use num_format::{Locale, ToFormattedString};

/// Convert a cell into a number, or `None` when it holds no usable value.
///
/// - Numeric cells pass through; booleans read as 1/0.
/// - Text is trimmed, checked against the configured blank tokens, then
///   parsed with the standard float grammar.
/// - Non-finite results (`inf`, `NaN`) count as missing.
///
/// No rounding or unit conversion happens here.
pub fn coerce_numeric(cell: &CellValue, config: &LoaderConfig) -> Option<f64> {
    let value = match cell {
        CellValue::Empty => return None,
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        CellValue::Text(s) => {
            if config.is_blank(s) {
                return None;
            }
            s.trim().parse::<f64>().ok()?
        }
    };
    value.is_finite().then_some(value)
}

/// True when the cell carries no value: empty, or text that is a blank token.
pub fn is_missing(cell: &CellValue, config: &LoaderConfig) -> bool {
    match cell {
        CellValue::Empty => true,
        CellValue::Text(s) => config.is_blank(s),
        CellValue::Number(n) => n.is_nan(),
        CellValue::Bool(_) => false,
    }
}

/// Upper-case a label and fold the Turkish letters the source files use, so
/// "Verilen", "VERİLEN" and "VERILEN" compare equal.
pub fn fold_label(s: &str) -> String {
    s.chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'İ' => 'I',
            'Ö' => 'O',
            'Ü' => 'U',
            'Ş' => 'S',
            'Ç' => 'C',
            'Ğ' => 'G',
            '³' => '3',
            other => other,
        })
        .collect()
}

/// Whether an already folded label contains any of the keywords.
pub fn contains_any(folded: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| folded.contains(k))
}

pub fn round_to(n: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (n * factor).round() / factor
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    let s = format!("{:.*}", decimals, n.abs());
    let neg = n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Past u128 (about 3.4e38) the digits are shown unseparated.
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Volumes are shown as whole cubic metres.
pub fn format_volume(n: f64) -> String {
    format_number(n, 0)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn coerces_plain_numbers() {
        let config = LoaderConfig::default();
        assert_eq!(coerce_numeric(&text("1000"), &config), Some(1000.0));
        assert_eq!(coerce_numeric(&text("  812.5 "), &config), Some(812.5));
        assert_eq!(coerce_numeric(&text("-3"), &config), Some(-3.0));
        assert_eq!(coerce_numeric(&CellValue::Number(42.0), &config), Some(42.0));
        assert_eq!(coerce_numeric(&CellValue::Bool(true), &config), Some(1.0));
    }

    #[test]
    fn blank_tokens_and_garbage_are_missing() {
        let config = LoaderConfig::default();
        for raw in ["", " ", "N/A", "#N/A", "nan", "abc", "1.2.3", "12 m3"] {
            assert_eq!(coerce_numeric(&text(raw), &config), None, "{raw:?}");
        }
        assert_eq!(coerce_numeric(&CellValue::Empty, &config), None);
        assert_eq!(coerce_numeric(&text("inf"), &config), None);
        assert_eq!(coerce_numeric(&CellValue::Number(f64::NAN), &config), None);
    }

    #[test]
    fn folding_ignores_case_and_turkish_letters() {
        assert_eq!(fold_label("Verilen Su Miktarı m³"), "VERILEN SU MIKTARI M3");
        assert_eq!(fold_label("VERİLEN"), "VERILEN");
        assert_eq!(fold_label("ölçülen"), "OLCULEN");
        assert_eq!(fold_label("Bölge"), "BOLGE");
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(-0.2, 0), "0");
        assert_eq!(format_volume(109.6), "110");
        assert_eq!(format_int(9855usize), "9,855");
    }

    #[test]
    fn huge_values_keep_their_digits() {
        assert_eq!(format_number(1e20, 0), "100,000,000,000,000,000,000");
        assert_eq!(format_number(-2.5e19, 0), "-25,000,000,000,000,000,000");
        let beyond = format_number(1e40, 0);
        assert_eq!(beyond.len(), 41);
        assert!(beyond.starts_with('1'));
    }

    #[test]
    fn rounds_to_decimals() {
        assert_eq!(round_to(55.0000001, 1), 55.0);
        assert_eq!(round_to(12.345, 1), 12.3);
        assert_eq!(round_to(2.0 / 3.0 * 100.0, 2), 66.67);
    }
}

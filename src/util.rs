// Utility helpers for numeric coercion, basic statistics and formatting.
//
// Everything that deals with "dirty" cell text lives here so the rest of
// the code can assume clean, finite values.
use crate::types::RawValue;
use num_format::{Locale, ToFormattedString};

/// Coerce a raw cell into a finite `f64`.
///
/// - Trims whitespace; empty cells are undefined.
/// - Strips thousands separators like `","` before parsing.
/// - `nan`, `inf` and anything else that is not a finite number is undefined.
pub fn coerce_f64(raw: &RawValue) -> Option<f64> {
    let v = match raw {
        RawValue::Empty => return None,
        RawValue::Number(v) => *v,
        RawValue::Text(s) => parse_f64_safe(s)?,
    };
    v.is_finite().then_some(v)
}

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
pub fn parse_f64_safe(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Customer label of a raw cell; blank labels are undefined.
pub fn coerce_label(raw: &RawValue) -> Option<String> {
    match raw {
        RawValue::Empty => None,
        RawValue::Number(v) if v.is_nan() => None,
        // integral values print without a trailing ".0"
        RawValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{}", *v as i64)),
        RawValue::Number(v) => Some(v.to_string()),
        RawValue::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
    }
}

/// Arithmetic mean over the finite values only; NaN when there are none.
pub fn finite_mean(v: &[f64]) -> f64 {
    let finite: Vec<f64> = v.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    average(&finite)
}

/// Median over the finite values only; NaN when there are none.
pub fn finite_median(v: &[f64]) -> f64 {
    let finite: Vec<f64> = v.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    median(finite)
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn median(mut v: Vec<f64>) -> f64 {
    // Accepts `Vec<f64>` by value so the sort can happen in place.
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return format_non_finite(n);
    }
    // Format to a plain fixed-decimal string like `1234567.89` first, then
    // let `num-format` insert commas into the integer portion.
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // past u64 the digits are shown without separators
    let mut res = match int_part.parse::<u64>() {
        Ok(int_val) => int_val.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // "-0" after rounding is just zero
    if n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// One-decimal percentage, e.g. `73.3%`.
pub fn format_percent(n: f64) -> String {
    if !n.is_finite() {
        return format_non_finite(n);
    }
    format!("{}%", format_number(n, 1))
}

pub fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}

fn format_non_finite(n: f64) -> String {
    if n.is_nan() {
        "n/a".to_string()
    } else if n > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

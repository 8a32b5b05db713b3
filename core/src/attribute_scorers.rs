//! Per-attribute point functions.
//!
//! RULE: A scorer never fails. Missing or unparsable input yields the
//! scorer's documented default (0 unless stated otherwise).
//! Thresholds are underwriting policy and are not configurable.

use crate::types::AttrValue;

type Input<'a> = Option<&'a AttrValue>;

fn text(v: Input<'_>) -> Option<String> {
    v.map(AttrValue::lowercase)
}

fn float(v: Input<'_>) -> Option<f64> {
    v.and_then(AttrValue::as_f64)
}

fn int(v: Input<'_>) -> Option<i64> {
    v.and_then(AttrValue::as_i64)
}

/// 0–15.
pub fn score_income(v: Input<'_>) -> u32 {
    match float(v) {
        None => 0,
        Some(inc) if inc < 40_000.0 => 0,
        Some(inc) if inc < 80_000.0 => 5,
        Some(inc) if inc < 150_000.0 => 10,
        Some(_) => 15,
    }
}

/// 0–10. Statuses that match none of the known words score 5.
pub fn score_employment(v: Input<'_>) -> u32 {
    let Some(s) = text(v) else { return 0 };
    if s.contains("unemployed") {
        0
    } else if s.contains("self") || s.contains("part") {
        5
    } else if s.contains("full") {
        10
    } else {
        5
    }
}

/// On-time repayment percentage. 0–15.
pub fn score_repayment(v: Input<'_>) -> u32 {
    match float(v) {
        None => 0,
        Some(pct) if pct < 70.0 => 0,
        Some(pct) if pct <= 90.0 => 7,
        Some(_) => 15,
    }
}

/// 0 or 8.
pub fn score_bankruptcies(v: Input<'_>) -> u32 {
    match float(v) {
        Some(n) if n <= 0.0 => 8,
        _ => 0,
    }
}

/// 0–7.
pub fn score_open_lines(v: Input<'_>) -> u32 {
    match int(v) {
        None => 0,
        Some(n) if n > 10 => 0,
        Some(n) if n >= 5 => 3,
        Some(_) => 7,
    }
}

/// Placeholder utilisation rule: any parseable limit scores 5.
pub fn score_card_limit(v: Input<'_>) -> u32 {
    match int(v) {
        Some(_) => 5,
        None => 0,
    }
}

/// 0–3.
pub fn score_age(v: Input<'_>) -> u32 {
    match int(v) {
        None => 0,
        Some(age) if age < 21 => 0,
        Some(age) if age <= 60 => 3,
        Some(_) => 2,
    }
}

/// 0 or 2.
pub fn score_citizenship(v: Input<'_>) -> u32 {
    match text(v) {
        Some(s) if s.contains("non") || s.contains("temp") => 0,
        Some(_) => 2,
        None => 0,
    }
}

/// 0–10.
pub fn score_savings(v: Input<'_>) -> u32 {
    match float(v) {
        None => 0,
        Some(s) if s < 5_000.0 => 0,
        Some(s) if s < 50_000.0 => 5,
        Some(_) => 10,
    }
}

/// 0–5.
pub fn score_cash_advances(v: Input<'_>) -> u32 {
    let Some(s) = text(v) else { return 0 };
    if s.contains("frequent") {
        0
    } else if s.contains("occasional") {
        3
    } else {
        5
    }
}

/// 0–5.
pub fn score_product_type(v: Input<'_>) -> u32 {
    let Some(s) = text(v) else { return 0 };
    if s.contains("platinum") {
        0
    } else if s.contains("gold") {
        3
    } else {
        5
    }
}

/// 0–5. "high" is checked first, so "High School" never reaches "grad".
pub fn score_education(v: Input<'_>) -> u32 {
    let Some(s) = text(v) else { return 0 };
    if s.contains("high") {
        0
    } else if s.contains("college") {
        3
    } else if s.contains("grad") {
        5
    } else {
        3
    }
}

/// Region risk band. 0–5.
pub fn score_region(v: Input<'_>) -> u32 {
    let Some(s) = text(v) else { return 0 };
    if s.contains("high") {
        0
    } else if s.contains("moderate") {
        3
    } else {
        5
    }
}

/// 1–3. Missing scores 1.
pub fn score_marital(v: Input<'_>) -> u32 {
    match text(v) {
        None => 1,
        Some(s) if s.contains("single") || s.contains("depend") => 1,
        Some(_) => 3,
    }
}

/// Identity-verification proxy. Always 2.
pub fn score_identity_verified(_v: Input<'_>) -> u32 {
    2
}

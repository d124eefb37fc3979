//! Display helpers shared by the CLI table and the HTTP summary.

/// Dollar amount with thousands separators, rounded to at most
/// `max_fraction_digits` decimals with trailing zeros dropped.
pub fn format_currency(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return format!("${value}");
    }

    // Ties round away from zero, as locale currency formatting does.
    let scale = 10f64.powi(i32::try_from(max_fraction_digits).unwrap_or(i32::MAX));
    let rounded = format!("{:.*}", max_fraction_digits, (value.abs() * scale).round() / scale);
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part.trim_end_matches('0')),
        None => (rounded.as_str(), ""),
    };

    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    let mut out = format!("${sign}{}", group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}%")
}

pub fn months_to_years(months: u32) -> String {
    format!("{:.1}", f64::from(months) / 12.0)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

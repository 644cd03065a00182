// Number formatting for chart hover text and lookup sentences.

/// Format `value` with `,` thousands grouping and two decimals, then a ` €` suffix.
///
/// `format_currency(1234.5) == "1,234.50 €"`.
pub fn format_currency(value: f64) -> String {
    format!("{} €", format_grouped(value, 2))
}

pub fn format_grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3 + 1);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative =
        value.is_sign_negative() && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

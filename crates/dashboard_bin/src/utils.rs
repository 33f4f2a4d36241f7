pub fn sanitize_coin_id(coin: &str) -> String {
    return coin
        .chars()
        .take(20)
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_lowercase();
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum QuantityError {
    #[error("Invalid quantity '{0}'")]
    Invalid(String),
    #[error("Quantity must not be negative, got {0}")]
    Negative(f64),
}

/// Parses a user-entered holding quantity. Blank input means zero.
pub fn parse_quantity(raw: &str) -> Result<f64, QuantityError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }

    let quantity: f64 = raw
        .parse()
        .map_err(|_| QuantityError::Invalid(raw.to_string()))?;

    if !quantity.is_finite() {
        return Err(QuantityError::Invalid(raw.to_string()));
    }
    if quantity < 0.0 {
        return Err(QuantityError::Negative(quantity));
    }
    Ok(quantity)
}

/// Two decimals with thousands separators, e.g. `1,234.56`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.push('-');
    }
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push('.');
    grouped.push_str(frac_part);
    grouped
}

pub fn format_change(pct: f64) -> String {
    format!("{:+.2}%", pct)
}

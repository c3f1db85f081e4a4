//! Parsing of free-form ingredient lines such as `"Мука 1/2 кг"`.
//!
//! Lines on eda.ru follow the `<name> <amount> <unit>` layout. The amount is the
//! last token starting with a digit; everything after it is the unit.

use crate::model::IngredientAmount;

/// Marker used instead of an amount for seasonings
pub const TO_TASTE: &str = "по вкусу";

/// Split an ingredient line into name, unit and amount.
///
/// Never fails: lines without an amount get `0.0` and an empty name.
pub fn parse_ingredient(line: &str) -> IngredientAmount {
    if let Some((name, _)) = line.split_once(TO_TASTE) {
        return IngredientAmount {
            name: name.trim().to_string(),
            unit: TO_TASTE.to_string(),
            amount: 1.0,
        };
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();

    // Go in reverse to find the unit first, then the amount
    let amount_at = tokens
        .iter()
        .rposition(|token| token.starts_with(|c: char| c.is_ascii_digit()));

    match amount_at {
        Some(idx) => IngredientAmount {
            name: tokens[..idx].join(" "),
            unit: tokens[idx + 1..].join(" "),
            amount: parse_amount(tokens[idx]),
        },
        None => IngredientAmount {
            name: String::new(),
            unit: tokens.join(" "),
            amount: 0.0,
        },
    }
}

/// Parse `"2"`, `"2,5"`, `"2.5"` or `"1/2"` into a number.
///
/// Trailing garbage (`"2-3"`, `"100г"`) is ignored; anything unparsable or
/// out of `f64` range is `0.0`.
pub fn parse_amount(token: &str) -> f64 {
    let normalized = token.replace(',', ".");
    let numeric_len = normalized
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '/'))
        .unwrap_or(normalized.len());
    let numeric = &normalized[..numeric_len];

    let amount = match numeric.split_once('/') {
        Some((numerator, denominator)) => {
            match (numerator.parse::<f64>(), denominator.parse::<f64>()) {
                (Ok(_), Ok(d)) if d == 0.0 => 0.0,
                (Ok(n), Ok(d)) => n / d,
                (Ok(n), Err(_)) => n,
                _ => 0.0,
            }
        }
        None => numeric.parse().unwrap_or(0.0),
    };

    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

/// Monetary amount in the business currency.
pub type Amount = Decimal;
/// Price per base unit (kg, litre, hour, day).
pub type Price = Decimal;
/// Measured quantity in the item's base unit.
pub type Quantity = Decimal;

/// Round an amount to the nearest whole currency unit.
///
/// Halves round away from zero, which matches how amounts are rendered on
/// receipts (`599_999.5` shows as `600_000`).
pub fn round_currency(amount: Amount) -> Amount {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Line total for a quantity priced per unit, or `None` when the product
/// does not fit in a [`Decimal`].
pub fn multiply_quantity_price(quantity: Quantity, unit_price: Price) -> Option<Amount> {
    quantity.checked_mul(unit_price)
}

/// Deserialize a numeric field treating `null` as zero.
///
/// Combine with `#[serde(default)]` so that absent fields are zero as well.
pub fn zero_if_null<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or(Decimal::ZERO))
}

/// Presentation settings applied when amounts leave the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub code: String,
    pub locale: String,
    pub decimals: u32,
}

impl CurrencyFormat {
    pub fn new(code: impl Into<String>, locale: impl Into<String>, decimals: u32) -> Self {
        Self {
            code: code.into(),
            locale: locale.into(),
            decimals,
        }
    }

    /// Digit group separator for the configured locale.
    pub fn group_separator(&self) -> char {
        let language = self
            .locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "fr" | "rw" | "sw" => ' ',
            _ => ',',
        }
    }

    fn decimal_separator(&self) -> char {
        if self.group_separator() == ' ' {
            ','
        } else {
            '.'
        }
    }

    /// Render an amount as `<CODE> <grouped digits>`.
    pub fn format(&self, amount: Amount) -> String {
        let rounded = if self.decimals == 0 {
            round_currency(amount)
        } else {
            amount.round_dp_with_strategy(self.decimals, RoundingStrategy::MidpointAwayFromZero)
        };
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = format!("{:.*}", self.decimals as usize, rounded.abs());
        let (integer, fraction) = match digits.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (digits.as_str(), None),
        };
        let mut grouped = group_digits(integer, self.group_separator());
        if let Some(fraction) = fraction {
            grouped.push(self.decimal_separator());
            grouped.push_str(fraction);
        }
        if negative {
            format!("{} -{}", self.code, grouped)
        } else {
            format!("{} {}", self.code, grouped)
        }
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new("RWF", "en-RW", 0)
    }
}

fn group_digits(integer: &str, separator: char) -> String {
    let len = integer.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

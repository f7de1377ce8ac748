use rust_decimal::{Decimal, RoundingStrategy};

/// Renders money amounts for summaries, e.g. `R$ 1234,50`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub symbol: String,
    pub decimal_separator: char,
    pub fraction_digits: u32,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            symbol: "R$".into(),
            decimal_separator: ',',
            fraction_digits: 2,
        }
    }
}

impl MoneyFormat {
    pub fn new(symbol: impl Into<String>, decimal_separator: char) -> Self {
        Self {
            symbol: symbol.into(),
            decimal_separator,
            ..Self::default()
        }
    }

    pub fn format(&self, amount: Decimal) -> String {
        let digits = self.fraction_digits;
        let rounded = amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
        let plain = format!("{:.*}", digits as usize, rounded);
        let localized = if self.decimal_separator == '.' {
            plain
        } else {
            plain.replace('.', &self.decimal_separator.to_string())
        };
        format!("{} {}", self.symbol, localized)
    }
}

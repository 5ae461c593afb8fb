use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported invoice currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Malaysian Ringgit
    MYR,
    /// Singapore Dollar
    SGD,
    /// US Dollar
    USD,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::MYR
    }
}

impl Currency {
    /// Returns the decimal scale for this currency
    pub fn scale(&self) -> u32 {
        2
    }

    /// Rounds half-up (away from zero) to the currency scale.
    ///
    /// Every stored and billed amount goes through here so the emailed total,
    /// the stored total and the gateway bill amount agree to the cent.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.scale(), RoundingStrategy::MidpointAwayFromZero)
    }

    /// Converts an amount to the smallest unit (sen/cents), as gateways expect
    pub fn to_minor_units(&self, amount: Decimal) -> Decimal {
        self.round(amount) * Decimal::from(10u64.pow(self.scale()))
    }

    /// Formats an amount for display with the correct decimal places
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!(
            "{} {:.width$}",
            self,
            self.round(amount),
            width = self.scale() as usize
        )
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::MYR => write!(f, "MYR"),
            Currency::SGD => write!(f, "SGD"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MYR" => Ok(Currency::MYR),
            "SGD" => Ok(Currency::SGD),
            "USD" => Ok(Currency::USD),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

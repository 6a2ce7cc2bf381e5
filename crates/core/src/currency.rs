use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

/// The closed set of currencies a bank notification may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Rub,
    Usd,
    Eur,
    Amd,
    Byn,
}

impl Currency {
    pub const HOME: Currency = Currency::Rub;

    /// Maps a code as it appears in a notification to a currency.
    ///
    /// Roubles show up as `RUB`, the legacy `RUR` and the bare `₽` sign.
    pub fn from_code(code: &str) -> Result<Self, UnknownCurrency> {
        match code {
            "RUB" | "RUR" | "₽" => Ok(Currency::Rub),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "AMD" => Ok(Currency::Amd),
            "BYN" => Ok(Currency::Byn),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }

    /// ISO 4217 code, the key used by rate tables.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Amd => "AMD",
            Currency::Byn => "BYN",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Rub => "₽",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Amd => "֏",
            Currency::Byn => "Br",
        }
    }

    pub fn is_home(self) -> bool {
        self == Currency::HOME
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Accepts either a notification code or a display symbol.
impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "$" => Ok(Currency::Usd),
            "€" => Ok(Currency::Eur),
            "֏" => Ok(Currency::Amd),
            "Br" => Ok(Currency::Byn),
            other => Currency::from_code(other),
        }
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Price representation as returned by the commerce backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with the backend's pre-formatted renderings.
///
/// The backend formats every amount for us (currency symbol, separators,
/// code); the storefront never formats or sums prices itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub raw: Decimal,
    /// Amount without symbol (e.g., "12.50").
    #[serde(default)]
    pub formatted: String,
    /// Amount with currency symbol (e.g., "$12.50").
    #[serde(default)]
    pub formatted_with_symbol: String,
    /// Amount with currency code (e.g., "12.50 USD").
    #[serde(default)]
    pub formatted_with_code: String,
}

impl Price {
    /// Display form used by the storefront templates.
    ///
    /// Falls back to the bare formatted amount, then to the raw decimal, if
    /// the backend omitted the symbol rendering.
    #[must_use]
    pub fn display(&self) -> String {
        if !self.formatted_with_symbol.is_empty() {
            self.formatted_with_symbol.clone()
        } else if !self.formatted.is_empty() {
            self.formatted.clone()
        } else {
            format!("{:.2}", self.raw)
        }
    }
}

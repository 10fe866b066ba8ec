use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const GRAMS_PER_KG: Decimal = Decimal::ONE_THOUSAND;

/// One cart line as seen by the rate engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub weight_grams: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(weight_grams: Decimal, quantity: u32) -> Self {
        LineItem {
            weight_grams,
            quantity,
        }
    }

    /// Weight of the whole line in grams, `None` on overflow.
    pub fn line_grams(&self) -> Option<Decimal> {
        self.weight_grams.checked_mul(Decimal::from(self.quantity))
    }
}

/// Total cart weight in kilograms.
///
/// Returns `None` if any line has a negative weight or the sum overflows.
pub fn total_weight_kg(items: &[LineItem]) -> Option<Decimal> {
    let mut grams = Decimal::ZERO;
    for item in items {
        if item.weight_grams.is_sign_negative() && !item.weight_grams.is_zero() {
            return None;
        }
        grams = grams.checked_add(item.line_grams()?)?;
    }
    grams.checked_div(GRAMS_PER_KG)
}

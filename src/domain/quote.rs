use serde::{Deserialize, Serialize};

/// A shipping price offer returned to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub service_name: String,

    /// Machine-readable code, `ESTANDAR-<route id>`
    pub service_code: String,

    /// Price in minor currency units (cents)
    pub total_price: i64,

    pub currency: String,

    pub description: String,
}

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::RoutePrices;

/// Weight covered by a route's start price, in kilograms.
pub const BASE_WEIGHT_KG: Decimal = Decimal::TWO;

/// Price a shipment of `total_kg` on a route.
///
/// Up to and including `base_kg` the start price applies. Every kilogram
/// above it, with any fractional remainder rounded up, adds the per-kg price.
/// Returns `None` on arithmetic overflow.
pub fn price_for_weight(prices: &RoutePrices, total_kg: Decimal, base_kg: Decimal) -> Option<Decimal> {
    let mut price = prices.start_price;

    if total_kg > base_kg {
        let extra_kg = total_kg.checked_sub(base_kg)?.ceil();
        price = price.checked_add(extra_kg.checked_mul(prices.extra_price_per_kg)?)?;
    }

    Some(price)
}

/// Convert a currency amount to integer minor units (cents).
///
/// Half-cent amounts round away from zero.
pub fn to_minor_units(price: Decimal) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;

    price
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> RoutePrices {
        RoutePrices::new(Decimal::new(255, 2), Decimal::new(35, 2))
    }

    fn kg(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_base_price_up_to_threshold() {
        assert_eq!(price_for_weight(&local(), kg("0"), BASE_WEIGHT_KG), Some(kg("2.55")));
        assert_eq!(price_for_weight(&local(), kg("1.2"), BASE_WEIGHT_KG), Some(kg("2.55")));
        assert_eq!(price_for_weight(&local(), kg("2.000"), BASE_WEIGHT_KG), Some(kg("2.55")));
    }

    #[test]
    fn test_any_excess_charges_a_whole_kg() {
        assert_eq!(price_for_weight(&local(), kg("2.001"), BASE_WEIGHT_KG), Some(kg("2.90")));
        assert_eq!(price_for_weight(&local(), kg("2.5"), BASE_WEIGHT_KG), Some(kg("2.90")));
        assert_eq!(price_for_weight(&local(), kg("3"), BASE_WEIGHT_KG), Some(kg("2.90")));
        assert_eq!(price_for_weight(&local(), kg("3.01"), BASE_WEIGHT_KG), Some(kg("3.25")));
    }

    #[test]
    fn test_galapagos_heavy_parcel() {
        let galapagos = RoutePrices::new(kg("8.70"), kg("2.54"));
        // 10.2 kg -> 9 extra kg
        assert_eq!(
            price_for_weight(&galapagos, kg("10.2"), BASE_WEIGHT_KG),
            Some(kg("31.56"))
        );
    }

    #[test]
    fn test_overflow_is_none() {
        let prices = RoutePrices::new(Decimal::ONE, Decimal::MAX);
        assert_eq!(price_for_weight(&prices, kg("1000"), BASE_WEIGHT_KG), None);
    }

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(to_minor_units(kg("2.90")), Some(290));
        assert_eq!(to_minor_units(kg("4.444")), Some(444));
        assert_eq!(to_minor_units(kg("4.445")), Some(445));
        assert_eq!(to_minor_units(kg("0.005")), Some(1));
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_minor_units_overflow_is_none() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
    }
}

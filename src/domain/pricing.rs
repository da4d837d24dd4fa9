//! Derived pricing fields.

/// Value shown when no unit price can be computed.
pub const PRICE_PLACEHOLDER: f64 = 0.0;

/// Unit price of a product, rounded to two decimals.
///
/// Returns [`PRICE_PLACEHOLDER`] unless both inputs are finite and strictly positive,
/// so a zero quantity never yields an infinite or NaN price.
pub fn price_per_unit(cost_price: f64, quantity: f64) -> f64 {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(cost_price) || !valid(quantity) {
        return PRICE_PLACEHOLDER;
    }
    let price = round2(cost_price / quantity);
    if price.is_finite() {
        price
    } else {
        PRICE_PLACEHOLDER
    }
}

/// Rounds half away from zero at two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Presentation form of a price: always two decimals.
pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

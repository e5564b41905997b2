//! Price change detection and classification

use crate::shared::utils::round2;

use super::{PriceChangeEvent, PriceDirection};

/// Compare the previous current price against a fresh observation
///
/// No event on the first observation, on an unchanged price, or on a zero
/// baseline (percent change is undefined there). The percent change is
/// rounded to two decimals.
pub fn detect_change(name: &str, old_price: Option<f64>, new_price: f64) -> Option<PriceChangeEvent> {
    let old_price = old_price?;
    if old_price == new_price || old_price == 0.0 {
        return None;
    }

    let delta = new_price - old_price;
    let direction = if delta > 0.0 {
        PriceDirection::Increase
    } else {
        PriceDirection::Decrease
    };

    Some(PriceChangeEvent {
        name: name.to_string(),
        old_price,
        new_price,
        percent_change: round2(delta / old_price * 100.0),
        direction,
    })
}

//! Utility functions and helpers

/// Format a price for display
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("¥{:.2}", p),
        None => "N/A".to_string(),
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

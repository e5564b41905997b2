//! JD.com price lookup with a primary API and a fallback

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::shared::errors::FetchError;

use super::PriceProvider;

const PRIMARY_BASE_URL: &str = "https://p.3.cn";
const FALLBACK_BASE_URL: &str = "https://api.m.jd.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// JD.com price client
///
/// Tries the batch price API first and falls back to the catalog endpoint
/// when it fails. Each attempt is bounded by a 10 second timeout.
pub struct JdPriceClient {
    http_client: Client,
    primary_base_url: String,
    fallback_base_url: String,
}

impl JdPriceClient {
    pub fn new() -> Self {
        Self::with_base_urls(PRIMARY_BASE_URL, FALLBACK_BASE_URL)
    }

    /// Base URLs are injectable so tests can point at a local server
    pub fn with_base_urls(primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            primary_base_url: primary.into(),
            fallback_base_url: fallback.into(),
        }
    }

    async fn fetch_primary(&self, sku_id: &str) -> Result<f64, FetchError> {
        let url = format!("{}/prices/mgets?skuIds=J_{}", self.primary_base_url, sku_id);
        debug!("fetching price from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Referer", "https://www.jd.com/")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body: Value = response.json().await.map_err(classify_request_error)?;
        parse_primary_response(&body)
    }

    async fn fetch_fallback(&self, sku_id: &str) -> Result<f64, FetchError> {
        let url = format!(
            "{}/?functionId=getCatalogProduct&skuId={}",
            self.fallback_base_url, sku_id
        );
        debug!("fetching price from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body: Value = response.json().await.map_err(classify_request_error)?;
        parse_fallback_response(&body)
    }
}

#[async_trait]
impl PriceProvider for JdPriceClient {
    async fn fetch_price(&self, sku_id: &str) -> Result<f64, FetchError> {
        match self.fetch_primary(sku_id).await {
            Ok(price) => Ok(price),
            Err(primary_err) => {
                warn!("⚠️ price API failed for {}: {}", sku_id, primary_err);
                match self.fetch_fallback(sku_id).await {
                    Ok(price) => Ok(price),
                    Err(fallback_err) => {
                        warn!("⚠️ fallback API failed for {}: {}", sku_id, fallback_err);
                        Err(fallback_err)
                    }
                }
            }
        }
    }
}

fn classify_request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Malformed(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

/// The batch API answers with an array of `{"p": "<price>", ...}` objects,
/// one per requested SKU
fn parse_primary_response(body: &Value) -> Result<f64, FetchError> {
    let first = body
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| FetchError::Malformed("expected a non-empty price array".to_string()))?;

    let price = first
        .get("p")
        .and_then(price_as_f64)
        .ok_or_else(|| FetchError::Malformed("price field missing".to_string()))?;

    validate_price(price)
}

/// The catalog endpoint nests the price at varying depths; take the first
/// `"p"` field anywhere in the document that parses as a number
fn parse_fallback_response(body: &Value) -> Result<f64, FetchError> {
    let price = find_price_field(body)
        .ok_or_else(|| FetchError::Malformed("no price field in response".to_string()))?;

    validate_price(price)
}

fn find_price_field(value: &Value) -> Option<f64> {
    match value {
        Value::Object(map) => {
            if let Some(price) = map.get("p").and_then(price_as_f64) {
                return Some(price);
            }
            map.values().find_map(find_price_field)
        }
        Value::Array(items) => items.iter().find_map(find_price_field),
        _ => None,
    }
}

fn price_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// The provider reports `-1.00` or `0` for delisted items; only a positive
/// price counts as a successful lookup
fn validate_price(price: f64) -> Result<f64, FetchError> {
    if price > 0.0 {
        Ok(price)
    } else {
        Err(FetchError::Malformed(format!("non-positive price {}", price)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_primary_response() {
        let body = json!([{"id": "J_100026643164", "p": "299.00", "m": "9999.00"}]);
        assert_eq!(parse_primary_response(&body).unwrap(), 299.0);
    }

    #[test]
    fn test_parse_primary_response_numeric_price() {
        let body = json!([{"p": 279.5}]);
        assert_eq!(parse_primary_response(&body).unwrap(), 279.5);
    }

    #[test]
    fn test_parse_primary_response_empty_array() {
        let body = json!([]);
        assert!(matches!(
            parse_primary_response(&body),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_primary_response_rejects_delisted() {
        let body = json!([{"p": "-1.00"}]);
        assert!(matches!(
            parse_primary_response(&body),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_fallback_response_nested() {
        let body = json!({
            "code": "0",
            "data": {"product": {"price": {"p": "329.00", "op": "399.00"}}}
        });
        assert_eq!(parse_fallback_response(&body).unwrap(), 329.0);
    }

    #[test]
    fn test_parse_fallback_response_without_price() {
        let body = json!({"code": "0", "data": {}});
        assert!(matches!(
            parse_fallback_response(&body),
            Err(FetchError::Malformed(_))
        ));
    }
}

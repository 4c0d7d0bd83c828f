//! HTTP adapter for the external exchange rate source.

use std::time::Duration;

use async_trait::async_trait;
use inventory_types::{ExternalRateSource, Rate, RateError};
use reqwest::Client;
use serde_json::Value;

/// Default source: the official BCV rate as published by pydolarve.
pub const DEFAULT_RATE_SOURCE_URL: &str = "https://pydolarve.org/api/v1/dollar?page=bcv";

/// JSON pointer to the rate in the default source's payload.
pub const DEFAULT_RATE_POINTER: &str = "/monitors/usd/price";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the rate with a GET request and reads it from the JSON body.
pub struct HttpRateSource {
    url: String,
    pointer: String,
    http: Client,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>, pointer: impl Into<String>) -> Result<Self, RateError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RateError::Network(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            pointer: pointer.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExternalRateSource for HttpRateSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch_rate(&self) -> Result<Rate, RateError> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RateError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RateError::Network(format!(
                "Rate source answered {}",
                resp.status()
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| RateError::Network(e.to_string()))?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| RateError::MalformedResponse(e.to_string()))?;

        let rate = extract_rate(&body, &self.pointer)?;
        tracing::debug!(rate = rate.value(), "Rate source answered");
        Ok(rate)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Reads a positive rate at `pointer`.
///
/// Accepts JSON numbers as well as numeric strings using either `.` or `,`
/// as the decimal separator.
pub fn extract_rate(body: &Value, pointer: &str) -> Result<Rate, RateError> {
    let raw = body
        .pointer(pointer)
        .ok_or_else(|| RateError::MalformedResponse(format!("No value at {}", pointer)))?;

    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => normalize_decimal_string(s).parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        RateError::MalformedResponse(format!("Value at {} is not a number: {}", pointer, raw))
    })?;

    Ok(Rate::new(value)?)
}

fn normalize_decimal_string(s: &str) -> String {
    s.trim().replace(',', ".")
}

//! Marketstack end-of-day provider.
//!
//! Issues a single blocking `GET {base_url}/eod` per call. No retry, no
//! backoff, no pagination loop: a non-success status is a hard failure that
//! carries the status code and response body.

use super::provider::{DataError, EodProvider, EodRequest, RawEodRecord};
use serde::Deserialize;

/// Production endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.marketstack.com/v1";

/// Marketstack `/eod` response envelope.
#[derive(Debug, Deserialize)]
struct EodResponse {
    pagination: Option<Pagination>,
    data: Vec<RawEodRecord>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    limit: Option<u64>,
    offset: Option<u64>,
    count: Option<u64>,
    total: Option<u64>,
}

/// Marketstack data provider.
pub struct MarketstackProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl MarketstackProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("eodlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Root URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn eod_url(&self) -> String {
        format!("{}/eod", self.base_url)
    }

    /// Query string for the `/eod` endpoint.
    ///
    /// A missing key is sent as an empty `access_key`; the remote side
    /// answers that with an authentication failure.
    pub fn query_params(api_key: Option<&str>, request: &EodRequest) -> Vec<(&'static str, String)> {
        vec![
            ("access_key", api_key.unwrap_or_default().to_string()),
            ("symbols", request.symbols.join(",")),
            ("limit", request.limit.to_string()),
            ("offset", request.offset.to_string()),
            ("sort", "ASC".to_string()),
            ("date_from", request.date_from.format("%Y-%m-%d").to_string()),
            ("date_to", request.date_to.format("%Y-%m-%d").to_string()),
        ]
    }

    /// Parse a success body into raw records.
    fn parse_response(body: &str) -> Result<Vec<RawEodRecord>, DataError> {
        let resp: EodResponse = serde_json::from_str(body)
            .map_err(|e| DataError::ResponseFormat(format!("failed to parse /eod body: {e}")))?;

        if let Some(page) = &resp.pagination {
            tracing::debug!(
                limit = page.limit,
                offset = page.offset,
                count = page.count,
                total = page.total,
                "marketstack pagination"
            );
            if let Some(total) = page.total {
                if total > resp.data.len() as u64 {
                    tracing::warn!(
                        "response holds {} of {total} available records; raise --limit or page with --offset",
                        resp.data.len()
                    );
                }
            }
        }

        Ok(resp.data)
    }
}

impl EodProvider for MarketstackProvider {
    fn name(&self) -> &str {
        "marketstack"
    }

    fn fetch_eod(
        &self,
        api_key: Option<&str>,
        request: &EodRequest,
    ) -> Result<Vec<RawEodRecord>, DataError> {
        let resp = self
            .client
            .get(self.eod_url())
            .query(&Self::query_params(api_key, request))
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| DataError::Network(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::error!("API call failed: {} - {body}", status.as_u16());
            return Err(DataError::RemoteRequest {
                status: status.as_u16(),
                body,
            });
        }

        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn query_params_cover_the_eod_contract() {
        let req = EodRequest::new(
            vec!["AAPL".into(), "MSFT".into()],
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        )
        .with_offset(5);

        let params = MarketstackProvider::query_params(Some("secret"), &req);
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("access_key"), "secret");
        assert_eq!(get("symbols"), "AAPL,MSFT");
        assert_eq!(get("limit"), "1000");
        assert_eq!(get("offset"), "5");
        assert_eq!(get("sort"), "ASC");
        assert_eq!(get("date_from"), "2025-01-01");
        assert_eq!(get("date_to"), "2025-01-10");
    }

    #[test]
    fn missing_key_is_sent_empty() {
        let req = EodRequest::new(
            vec!["AAPL".into()],
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        );
        let params = MarketstackProvider::query_params(None, &req);
        assert_eq!(params[0], ("access_key", String::new()));
    }

    #[test]
    fn parse_response_reads_data_array() {
        let body = r#"{"pagination":{"limit":1000,"offset":0,"count":1,"total":1},
            "data":[{"date":"2025-01-03T00:00:00+0000","symbol":"AAPL","open":130.0,
            "high":131.0,"low":129.0,"close":130.5,"volume":1000000,"adj_close":130.5}]}"#;
        let records = MarketstackProvider::parse_response(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].close, Some(130.5));
    }

    #[test]
    fn parse_response_without_data_is_format_error() {
        let err = MarketstackProvider::parse_response(r#"{"error":{"code":"x"}}"#).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormat(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let provider = MarketstackProvider::new("http://localhost:9/v1/").unwrap();
        assert_eq!(provider.eod_url(), "http://localhost:9/v1/eod");
    }
}

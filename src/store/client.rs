use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::StoreConfig;
use crate::store::{
    CropDiseaseInfo, FarmerProfile, PredictionRecord, ProfileChanges, RegionalAlert,
};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

/// Client for the remote table service (PostgREST wire contract): plain
/// filter/sort/insert/update/delete calls, no joins or transactions.
pub struct TableStore {
    client: Client,
    base_url: String,
}

impl TableStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(anyhow!("store url is not configured"));
        }
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(config.api_key.trim())
            .context("store api key contains invalid header characters")?;
        headers.insert("apikey", key);
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .context("store api key contains invalid header characters")?;
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .user_agent("cropsense/0.2")
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build store HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    pub async fn insert_prediction(&self, record: &PredictionRecord) -> Result<PredictionRecord> {
        let request = self
            .client
            .post(self.table_url("predictions"))
            .header("Prefer", "return=representation")
            .json(record);
        let mut rows: Vec<PredictionRecord> = fetch_rows(request, "predictions insert").await?;
        rows.pop()
            .ok_or_else(|| anyhow!("predictions insert returned no row"))
    }

    pub async fn load_predictions(
        &self,
        user_id: &str,
        crop_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>> {
        let mut query = vec![
            ("user_id".to_string(), format!("eq.{user_id}")),
            ("order".to_string(), "created_at.desc".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        if let Some(crop) = crop_type {
            query.push(("crop_type".to_string(), format!("eq.{crop}")));
        }
        let request = self.client.get(self.table_url("predictions")).query(&query);
        fetch_rows(request, "predictions select").await
    }

    pub async fn count_predictions(&self, user_id: &str, disease: Option<&str>) -> Result<u64> {
        let mut query = vec![
            ("user_id".to_string(), format!("eq.{user_id}")),
            ("select".to_string(), "id".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        if let Some(disease) = disease {
            query.push(("disease_name".to_string(), format!("eq.{disease}")));
        }
        let response = self
            .client
            .get(self.table_url("predictions"))
            .header("Prefer", "count=exact")
            .query(&query)
            .send()
            .await
            .context("failed predictions count request")?;
        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        expect_success(response, "predictions count").await?;
        range
            .as_deref()
            .and_then(parse_content_range_total)
            .ok_or_else(|| anyhow!("predictions count response missing content-range total"))
    }

    pub async fn delete_prediction(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.table_url("predictions"))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .context("failed predictions delete request")?;
        expect_success(response, "predictions delete").await?;
        Ok(())
    }

    /// Active regional advisories, optionally narrowed to one region.
    pub async fn active_alerts(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RegionalAlert>> {
        let mut query = vec![
            ("is_active".to_string(), "eq.true".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        if let Some(region) = region {
            query.push(("region".to_string(), format!("eq.{region}")));
        }
        let request = self.client.get(self.table_url("alerts")).query(&query);
        fetch_rows(request, "alerts select").await
    }

    pub async fn load_profile(&self, user_id: &str) -> Result<Option<FarmerProfile>> {
        let request = self
            .client
            .get(self.table_url("profiles"))
            .query(&[("user_id", format!("eq.{user_id}")), ("limit", "1".into())]);
        let mut rows: Vec<FarmerProfile> = fetch_rows(request, "profiles select").await?;
        Ok(rows.pop())
    }

    pub async fn update_profile(&self, user_id: &str, changes: &ProfileChanges) -> Result<()> {
        if changes.is_empty() {
            return Err(anyhow!("no profile fields to update"));
        }
        let response = self
            .client
            .patch(self.table_url("profiles"))
            .query(&[("user_id", format!("eq.{user_id}"))])
            .json(changes)
            .send()
            .await
            .context("failed profiles update request")?;
        expect_success(response, "profiles update").await?;
        Ok(())
    }

    pub async fn disease_info(&self, crop_type: Option<&str>) -> Result<Vec<CropDiseaseInfo>> {
        let mut query = vec![("order".to_string(), "crop_type.asc".to_string())];
        if let Some(crop) = crop_type {
            query.push(("crop_type".to_string(), format!("eq.{crop}")));
        }
        let request = self
            .client
            .get(self.table_url("crop_disease_info"))
            .query(&query);
        fetch_rows(request, "crop_disease_info select").await
    }
}

async fn fetch_rows<T: DeserializeOwned>(request: RequestBuilder, label: &str) -> Result<Vec<T>> {
    let response = request
        .send()
        .await
        .with_context(|| format!("failed {label} request"))?;
    let body = expect_success(response, label).await?;
    serde_json::from_str(&body).with_context(|| format!("invalid JSON in {label} response"))
}

async fn expect_success(response: Response, label: &str) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed reading {label} response body"))?;
    if !status.is_success() {
        let preview: String = body.chars().take(180).collect();
        return Err(anyhow!("{label} returned {status}: {preview}"));
    }
    Ok(body)
}

/// Extracts the total from a `content-range` header like `0-4/27`.
fn parse_content_range_total(raw: &str) -> Option<u64> {
    raw.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::parse_content_range_total;
    use crate::store::RegionalAlert;

    #[test]
    fn parses_content_range_totals() {
        assert_eq!(parse_content_range_total("0-4/27"), Some(27));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn parses_alert_rows_from_wire_shape() {
        let payload = serde_json::json!([{
            "id": "a1",
            "region": "Punjab",
            "crop_type": "Rice",
            "alert_type": "disease_outbreak",
            "severity": "High",
            "message": "Leaf blast reported in neighboring districts",
            "is_active": true,
            "expires_at": null,
            "created_at": "2026-08-01T06:00:00Z"
        }]);
        let alerts: Vec<RegionalAlert> = serde_json::from_value(payload).expect("parse alerts");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].region, "Punjab");
        assert_eq!(alerts[0].crop_type.as_deref(), Some("Rice"));
    }
}

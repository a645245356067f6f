use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::store::{LookupStore, StoreError};
use crate::core::config::JournalConfig;
use crate::core::error::BrewlogError;
use crate::lookup::models::{
    LookupEntry, LookupId, LookupKind, RecordKind, RewriteAction, UsageInfo, UsageSample,
};

/// Lookup entry as the journal API serves it: the kind is implied by the
/// route, not carried in the body.
#[derive(Debug, Deserialize)]
struct LookupDto {
    id: LookupId,
    name: String,
    #[serde(default)]
    short_form: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl LookupDto {
    fn into_entry(self, kind: LookupKind) -> LookupEntry {
        LookupEntry {
            id: self.id,
            kind,
            name: self.name,
            short_form: self.short_form,
            url: self.url,
            image_url: self.image_url,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsageDto {
    in_use: bool,
    usage_count: u64,
    #[serde(default)]
    usage_type: Option<RecordKind>,
    #[serde(default)]
    recent_usage: Vec<UsageSampleDto>,
}

#[derive(Debug, Deserialize)]
struct UsageSampleDto {
    timestamp: DateTime<Utc>,
    label: String,
}

#[derive(Debug, Serialize)]
struct UpdateReferencesBody {
    action: &'static str,
    replacement_id: Option<LookupId>,
}

#[derive(Debug, Deserialize)]
struct UpdatedCountDto {
    updated_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// HTTP client for the journal API's lookup endpoints.
pub struct JournalClient {
    base_url: String,
    client: Client,
}

impl JournalClient {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: Url, timeout_secs: u64) -> Self {
        let base_url = base_url.as_str().trim_end_matches('/').to_string();
        info!("Journal client initialized (url={})", base_url);
        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    pub fn from_config(config: &JournalConfig) -> Result<Self, BrewlogError> {
        let base_url = Url::parse(&config.api.base_url)
            .map_err(|e| BrewlogError::Configuration(format!("invalid api.base_url: {e}")))?;
        Ok(Self::new(base_url, config.api.timeout_secs))
    }

    fn endpoint(&self, kind: LookupKind, id: LookupId, suffix: &str) -> String {
        let mut url = format!("{}/{}/{}", self.base_url, kind.path_segment(), id);
        if !suffix.is_empty() {
            url.push('/');
            url.push_str(suffix);
        }
        url
    }

    /// Extract the API's own `{"error": ...}` message so failures surface
    /// the underlying cause, never a generic status line.
    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {status}"),
        }
    }

    fn transport_error(err: reqwest::Error) -> StoreError {
        StoreError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl LookupStore for JournalClient {
    async fn find_lookup(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<Option<LookupEntry>, StoreError> {
        let url = self.endpoint(kind, id, "");
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Rejected(Self::error_message(response).await));
        }
        let dto: LookupDto = response.json().await.map_err(Self::transport_error)?;
        Ok(Some(dto.into_entry(kind)))
    }

    async fn lookup_usage(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<UsageInfo, StoreError> {
        let url = self.endpoint(kind, id, "usage");
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        // An absent entity has zero usage; the deletion flow treats the end
        // state "already gone" as satisfied rather than as an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(UsageInfo::none(kind.counted_records()));
        }
        if !response.status().is_success() {
            return Err(StoreError::Rejected(Self::error_message(response).await));
        }

        let dto: UsageDto = response.json().await.map_err(Self::transport_error)?;
        Ok(UsageInfo {
            in_use: dto.in_use,
            usage_count: dto.usage_count,
            counted: dto.usage_type.unwrap_or_else(|| kind.counted_records()),
            recent_samples: dto
                .recent_usage
                .into_iter()
                .map(|s| UsageSample {
                    timestamp: s.timestamp,
                    label: s.label,
                })
                .collect(),
        })
    }

    async fn rewrite_references(
        &self,
        kind: LookupKind,
        id: LookupId,
        action: RewriteAction,
    ) -> Result<u64, StoreError> {
        let url = self.endpoint(kind, id, "update_references");
        let body = UpdateReferencesBody {
            action: action.wire_name(),
            replacement_id: action.replacement(),
        };
        debug!("POST {} ({})", url, action);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(StoreError::Rejected(Self::error_message(response).await));
        }
        let dto: UpdatedCountDto = response.json().await.map_err(Self::transport_error)?;
        Ok(dto.updated_count)
    }

    async fn delete_lookup(
        &self,
        kind: LookupKind,
        id: LookupId,
    ) -> Result<bool, StoreError> {
        let url = self.endpoint(kind, id, "");
        debug!("DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        // Already absent: the desired end state holds.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(StoreError::Rejected(Self::error_message(response).await));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_layout() {
        let client = JournalClient::new(
            Url::parse("http://localhost:5000/api/").unwrap(),
            10,
        );
        assert_eq!(
            client.endpoint(LookupKind::Roaster, LookupId(7), "usage"),
            "http://localhost:5000/api/roasters/7/usage"
        );
        assert_eq!(
            client.endpoint(LookupKind::BeanType, LookupId(3), ""),
            "http://localhost:5000/api/bean_types/3"
        );
    }

    #[test]
    fn test_update_references_wire_body() {
        let clear = UpdateReferencesBody {
            action: RewriteAction::Clear.wire_name(),
            replacement_id: RewriteAction::Clear.replacement(),
        };
        assert_eq!(
            serde_json::to_value(&clear).unwrap(),
            serde_json::json!({"action": "remove", "replacement_id": null})
        );

        let action = RewriteAction::Replace(LookupId(3));
        let replace = UpdateReferencesBody {
            action: action.wire_name(),
            replacement_id: action.replacement(),
        };
        assert_eq!(
            serde_json::to_value(&replace).unwrap(),
            serde_json::json!({"action": "replace", "replacement_id": 3})
        );
    }
}

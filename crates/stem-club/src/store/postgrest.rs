use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{RemoteError, RemoteStore, SelectQuery, UNIQUE_VIOLATION};

/// Client for a hosted PostgREST endpoint (the Supabase REST surface).
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    rest_url: String,
}

/// Error payload PostgREST returns for rejected requests.
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl PostgrestStore {
    pub fn new(
        project_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let anon_key = anon_key.into();
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&anon_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {anon_key}"))?);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to create HTTP client: {e}")))?;

        let project_url = project_url.into();
        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.rest_url, collection)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, RemoteError> {
    HeaderValue::from_str(raw)
        .map_err(|_| RemoteError::Transport("anon key is not a valid header value".to_string()))
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Transport("request timed out".to_string())
    } else {
        RemoteError::Transport(err.to_string())
    }
}

/// Map a non-success PostgREST response onto the store error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let parsed: PostgrestErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.details)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    if parsed.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return RemoteError::DuplicateKey(message);
    }

    RemoteError::Status {
        status: status.as_u16(),
        code: parsed.code,
        message,
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn insert(&self, collection: &str, record: Value) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.collection_url(collection))
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(collection, %status, "row inserted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_failure(status, &body);
        warn!(collection, %status, kind = error.label(), "insert rejected");
        Err(error)
    }

    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        let mut params = Vec::with_capacity(2);
        let select = if query.columns.is_empty() {
            "*".to_string()
        } else {
            query.columns.join(",")
        };
        params.push(("select", select));
        if let Some(column) = &query.order_by {
            params.push(("order", format!("{column}.asc")));
        }

        let response = self
            .client
            .get(self.collection_url(&query.collection))
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_failure(status, &body);
            warn!(collection = %query.collection, %status, kind = error.label(), "select rejected");
            return Err(error);
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_body_maps_to_duplicate_key() {
        let body = r#"{"code":"23505","details":"Key (email)=(a@b.co) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"members_email_key\""}"#;
        let error = classify_failure(StatusCode::CONFLICT, body);
        assert!(matches!(error, RemoteError::DuplicateKey(ref msg) if msg.contains("members_email_key")));
    }

    #[test]
    fn other_codes_keep_status_and_code() {
        let body = r#"{"code":"42501","message":"permission denied for table members"}"#;
        match classify_failure(StatusCode::UNAUTHORIZED, body) {
            RemoteError::Status {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("42501"));
                assert!(message.contains("permission denied"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_falls_back_to_reason_phrase() {
        match classify_failure(StatusCode::BAD_GATEWAY, "<html>upstream</html>") {
            RemoteError::Status { message, code, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert!(code.is_none());
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn trims_trailing_slash_from_project_url() {
        let store = PostgrestStore::new("https://club.supabase.co/", "key", Duration::from_secs(1))
            .expect("client builds");
        assert_eq!(
            store.collection_url("members"),
            "https://club.supabase.co/rest/v1/members"
        );
    }
}

//! Remote project store speaking the canvas JSON API.
//!
//! `GET  {api}/api/projects/{id}/canvas` returns the record list.
//! `POST {api}/api/projects/{id}/canvas` replaces it.
//! `GET  {api}/api/projects` lists project ids.
//! `DELETE {api}/api/projects/{id}` removes a project.

use super::{BoxFuture, ProjectStore, StorageError, StorageResult, decode_records, encode_records};
use crate::config::StoreConfig;
use crate::shapes::Shape;
use std::time::Duration;

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP-backed [`ProjectStore`].
pub struct HttpStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl HttpStore {
    /// Create a store from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StoreConfig) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Create a store configured from `SKETCHBOARD_*` environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(StoreConfig::from_env())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl ProjectStore for HttpStore {
    fn load(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>> {
        let url = self.config.canvas_url(project_id);
        let project_id = project_id.to_string();

        Box::pin(async move {
            log::debug!("GET {}", url);
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| StorageError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| StorageError::Transport(e.to_string()))?;

            parse_load_response(&project_id, status, &body)
        })
    }

    fn save(&self, project_id: &str, shapes: &[Shape]) -> BoxFuture<'_, StorageResult<()>> {
        let url = self.config.canvas_url(project_id);
        let payload = encode_records(shapes);

        Box::pin(async move {
            let payload = payload?;
            log::debug!("POST {} ({} bytes)", url, payload.len());
            let response = self
                .http
                .post(&url)
                .header("content-type", "application/json")
                .body(payload)
                .send()
                .await
                .map_err(|e| StorageError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            if (200..300).contains(&status) {
                return Ok(());
            }
            Err(StorageError::Http {
                status,
                body: error_body(response).await,
            })
        })
    }

    fn delete(&self, project_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let url = self.config.project_url(project_id);

        Box::pin(async move {
            log::debug!("DELETE {}", url);
            let response = self
                .http
                .delete(&url)
                .send()
                .await
                .map_err(|e| StorageError::Transport(e.to_string()))?;

            match response.status().as_u16() {
                200..=299 | 404 => Ok(()),
                status => Err(StorageError::Http {
                    status,
                    body: error_body(response).await,
                }),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let url = self.config.projects_url();

        Box::pin(async move {
            log::debug!("GET {}", url);
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| StorageError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| StorageError::Transport(e.to_string()))?;

            parse_list_response(status, &body)
        })
    }
}

/// Read an error response body for diagnostics. A body that cannot be read is
/// logged and reported as empty; the status alone still describes the failure.
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            log::warn!("Failed to read {} response body: {}", status, e);
            String::new()
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Interpret a canvas GET response.
pub(crate) fn parse_load_response(project_id: &str, status: u16, body: &str) -> StorageResult<Vec<Shape>> {
    match status {
        404 => Err(StorageError::NotFound(project_id.to_string())),
        200..=299 => decode_records(body),
        _ => Err(StorageError::Http {
            status,
            body: body.to_string(),
        }),
    }
}

/// Interpret a project list response: a JSON array of ids.
pub(crate) fn parse_list_response(status: u16, body: &str) -> StorageResult<Vec<String>> {
    if !(200..300).contains(&status) {
        return Err(StorageError::Http {
            status,
            body: body.to_string(),
        });
    }
    let mut ids: Vec<String> =
        serde_json::from_str(body).map_err(|e| StorageError::Serialization(e.to_string()))?;
    ids.sort();
    Ok(ids)
}

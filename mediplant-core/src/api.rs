//! Backend API client
//!
//! Typed wrapper over the REST contract at the configured base path. Every
//! call returns the raw JSON payload and leaves envelope unwrapping to the
//! normalization layer, so all endpoints share one decode path.
//!
//! The client is explicitly constructed from [`Config`] and carries an
//! optional bearer token for the protected admin call; token acquisition
//! itself lives outside this crate.

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{GENERIC_SEARCH_FAILURE, SearchError};
use crate::http::build_client;
use crate::models::ImageUpload;
use crate::search::SearchBackend;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client: build_client(config.timeout),
            token: None,
        }
    }

    /// Attach a bearer token for protected calls.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check the status and parse the body. Non-2xx responses surface the
    /// backend's structured error text verbatim when present.
    async fn handle(&self, response: Response) -> Result<Value, SearchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = structured_error_message(&body)
                .unwrap_or_else(|| GENERIC_SEARCH_FAILURE.to_string());
            warn!(status = %status, message = %message, "backend returned an error");
            return Err(SearchError::Backend {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn get(&self, path: &str) -> Result<Value, SearchError> {
        debug!(path = %path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        self.handle(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, SearchError> {
        debug!(path = %path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        self.handle(response).await
    }

    // ========================================================================
    // Plant endpoints
    // ========================================================================

    /// `GET /plants/all`
    pub async fn fetch_all_plants(&self) -> Result<Value, SearchError> {
        self.get("/plants/all").await
    }

    /// `GET /plants/{id}`
    pub async fn fetch_plant_by_id(&self, id: &str) -> Result<Value, SearchError> {
        self.get(&format!("/plants/{id}")).await
    }

    /// `GET /plants/search?query=`
    pub async fn search_plants_by_name(&self, query: &str) -> Result<Value, SearchError> {
        debug!(query = %query, "GET /plants/search");
        let response = self
            .client
            .get(self.url("/plants/search"))
            .query(&[("query", query)])
            .send()
            .await?;
        self.handle(response).await
    }

    /// `GET /plants/top-rated`
    pub async fn fetch_top_rated(&self) -> Result<Value, SearchError> {
        self.get("/plants/top-rated").await
    }

    /// `GET /plants/by-type?type=`
    pub async fn fetch_plants_by_type(&self, plant_type: &str) -> Result<Value, SearchError> {
        let response = self
            .client
            .get(self.url("/plants/by-type"))
            .query(&[("type", plant_type)])
            .send()
            .await?;
        self.handle(response).await
    }

    // ========================================================================
    // Search endpoints
    // ========================================================================

    /// `POST /search/general`
    pub async fn general_search(&self, body: Value) -> Result<Value, SearchError> {
        self.post("/search/general", &body).await
    }

    /// `POST /search/by-symptoms` with a natural-language description. The
    /// backend does the interpretation; no keyword matching happens here.
    pub async fn symptom_search(&self, description: &str) -> Result<Value, SearchError> {
        self.post(
            "/search/by-symptoms",
            &serde_json::json!({ "description": description }),
        )
        .await
    }

    /// `POST /search/by-visual`
    pub async fn visual_search(&self, features: &[String]) -> Result<Value, SearchError> {
        self.post(
            "/search/by-visual",
            &serde_json::json!({ "features": features }),
        )
        .await
    }

    // ========================================================================
    // Image endpoints
    // ========================================================================

    /// `POST /images/recognize`, multipart with the file under `image`.
    pub async fn recognize_image(&self, upload: &ImageUpload) -> Result<Value, SearchError> {
        debug!(
            file = %upload.file_name,
            size_bytes = upload.size_bytes(),
            "POST /images/recognize"
        );
        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(self.url("/images/recognize"))
            .multipart(form)
            .send()
            .await?;
        self.handle(response).await
    }

    // ========================================================================
    // Admin endpoints
    // ========================================================================

    /// `DELETE /admin/plants/{id}`, bearer token required.
    pub async fn delete_plant(&self, id: &str) -> Result<(), SearchError> {
        let builder = self.client.delete(self.url(&format!("/admin/plants/{id}")));
        let response = self.authorized(builder).send().await?;
        self.handle(response).await?;
        Ok(())
    }
}

impl SearchBackend for ApiClient {
    async fn search_by_name(&self, query: &str) -> Result<Value, SearchError> {
        self.search_plants_by_name(query).await
    }

    async fn search_by_symptoms(&self, description: &str) -> Result<Value, SearchError> {
        self.symptom_search(description).await
    }

    async fn search_by_visual(&self, features: &[String]) -> Result<Value, SearchError> {
        self.visual_search(features).await
    }

    async fn identify_image(&self, upload: &ImageUpload) -> Result<Value, SearchError> {
        self.recognize_image(upload).await
    }

    async fn fetch_plant(&self, id: &str) -> Result<Value, SearchError> {
        self.fetch_plant_by_id(id).await
    }
}

/// Pull a usable message out of a structured error body like
/// `{"error": "..."}` or `{"message": "..."}`.
fn structured_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value
        .get("error")
        .or_else(|| value.get("message"))?
        .as_str()?;
    let trimmed = message.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_error_message_prefers_error_field() {
        let body = r#"{"error": "Query must not be blank", "message": "other"}"#;
        assert_eq!(
            structured_error_message(body).as_deref(),
            Some("Query must not be blank")
        );
    }

    #[test]
    fn test_structured_error_message_falls_back_to_message() {
        let body = r#"{"message": "Plant not found"}"#;
        assert_eq!(
            structured_error_message(body).as_deref(),
            Some("Plant not found")
        );
    }

    #[test]
    fn test_unstructured_bodies_yield_nothing() {
        assert_eq!(structured_error_message("<html>502</html>"), None);
        assert_eq!(structured_error_message(""), None);
        assert_eq!(structured_error_message(r#"{"error": "  "}"#), None);
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let config = Config {
            api_url: "http://localhost:8080/api/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config);
        assert_eq!(client.url("/plants/all"), "http://localhost:8080/api/plants/all");
    }
}

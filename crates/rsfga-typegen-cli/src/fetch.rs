//! Authorization model retrieval from an OpenFGA-compatible API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use rsfga_typegen::model::ModelPayload;
use rsfga_typegen::{AuthorizationModel, TypegenError};

/// Error type for model retrieval.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("store {store_id} has no authorization models")]
    NoModels { store_id: String },

    #[error(transparent)]
    Model(#[from] TypegenError),
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    authorization_models: Vec<ModelPayload>,
}

/// Thin client for the authorization-model read endpoints.
#[derive(Debug, Clone)]
pub struct ModelClient {
    http: Client,
    api_url: String,
    api_token: Option<String>,
}

impl ModelClient {
    /// Creates a client for `api_url` (without a trailing `/stores`).
    pub fn new(
        api_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let api_url = api_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Request {
                url: api_url.clone(),
                source,
            })?;
        Ok(Self {
            http,
            api_url,
            api_token,
        })
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!(%url, "Fetching authorization model");
        let mut request = self.http.get(url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(body)
    }

    /// Reads one model, or the latest model of the store when `model_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failures, non-success responses, an
    /// empty store, or a payload that does not validate.
    pub async fn fetch_model(
        &self,
        store_id: &str,
        model_id: Option<&str>,
    ) -> Result<AuthorizationModel, FetchError> {
        let base = format!("{}/stores/{store_id}/authorization-models", self.api_url);

        let payload = match model_id {
            Some(id) => {
                let body = self.get(&format!("{base}/{id}")).await?;
                ModelPayload::from_json(&body)?
            }
            None => {
                let body = self.get(&format!("{base}?page_size=1")).await?;
                let list: ListModelsResponse = serde_json::from_str(&body).map_err(|e| {
                    TypegenError::MalformedModel {
                        message: format!("invalid model list payload: {e}"),
                    }
                })?;
                list.authorization_models
                    .into_iter()
                    .next()
                    .ok_or_else(|| FetchError::NoModels {
                        store_id: store_id.to_string(),
                    })?
            }
        };

        let model = AuthorizationModel::from_payload(payload)?;
        info!(
            store_id,
            model_id = model.id.as_deref().unwrap_or("<none>"),
            types = model.type_definitions.len(),
            "Fetched authorization model"
        );
        Ok(model)
    }
}

//! Command implementations.

pub mod config;
pub mod federation;

pub use config::run_config;
pub use federation::run_federation;

use kc_federation::{Component, ComponentApi, FederationError, FederationResult};
use reqwest::{header::LOCATION, Method, RequestBuilder, StatusCode};
use urlencoding::encode;

use crate::CliConfig;

/// API client for making requests to the Keycloak server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    /// Creates a new API client.
    pub fn new(config: &CliConfig, server_override: Option<&str>) -> crate::CliResult<Self> {
        let base_url = server_override
            .map(|s| s.to_string())
            .unwrap_or_else(|| config.server_url.clone());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token().map(str::to_string),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Makes a GET request.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> crate::CliResult<T> {
        let response = self.request(Method::GET, path).send().await?;
        handle_response(response).await
    }

    /// Makes a GET request, treating 404 as absent.
    pub async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> crate::CliResult<Option<T>> {
        let response = self.request(Method::GET, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(response).await.map(Some)
    }

    /// Makes a POST request and returns the id from the `Location` header.
    pub async fn post_created<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> crate::CliResult<String> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        handle_empty_response(response).await?;

        location
            .as_deref()
            .and_then(|location| location.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| crate::CliError::Api {
                status: status.as_u16(),
                message: "created resource without a Location header".to_string(),
            })
    }

    /// Makes a PUT request.
    pub async fn put<B: serde::Serialize>(&self, path: &str, body: &B) -> crate::CliResult<()> {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        handle_empty_response(response).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str) -> crate::CliResult<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        handle_empty_response(response).await
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Path of the component collection of a realm.
fn components_path(realm: &str) -> String {
    format!("/admin/realms/{}/components", encode(realm))
}

fn component_path(realm: &str, id: &str) -> String {
    format!("{}/{}", components_path(realm), encode(id))
}

impl ComponentApi for ApiClient {
    async fn find_by_type_and_name(
        &self,
        realm: &str,
        provider_type: &str,
        name: &str,
    ) -> FederationResult<Vec<Component>> {
        let path = format!(
            "{}?type={}&name={}",
            components_path(realm),
            encode(provider_type),
            encode(name)
        );
        tracing::debug!(%path, "GET");
        Ok(self.get(&path).await?)
    }

    async fn get(&self, id: &str, realm: &str) -> FederationResult<Option<Component>> {
        let path = component_path(realm, id);
        tracing::debug!(%path, "GET");
        Ok(self.get_optional(&path).await?)
    }

    async fn create(&self, component: &Component, realm: &str) -> FederationResult<Component> {
        let path = components_path(realm);
        tracing::debug!(%path, "POST");
        let id = self.post_created(&path, component).await?;
        ComponentApi::get(self, &id, realm)
            .await?
            .ok_or_else(|| FederationError::remote(format!("component {id} vanished after creation")))
    }

    async fn update(&self, component: &Component, realm: &str) -> FederationResult<()> {
        let id = component
            .id
            .as_deref()
            .ok_or_else(|| FederationError::validation("cannot update a component without id"))?;
        let path = component_path(realm, id);
        tracing::debug!(%path, "PUT");
        Ok(self.put(&path, component).await?)
    }

    async fn delete(&self, id: &str, realm: &str) -> FederationResult<()> {
        let path = component_path(realm, id);
        tracing::debug!(%path, "DELETE");
        Ok(ApiClient::delete(self, &path).await?)
    }

    async fn find_children(
        &self,
        parent_id: &str,
        realm: &str,
    ) -> FederationResult<Vec<Component>> {
        let path = format!("{}?parent={}", components_path(realm), encode(parent_id));
        tracing::debug!(%path, "GET");
        Ok(self.get(&path).await?)
    }
}

/// Handles a response with a body.
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> crate::CliResult<T> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(crate::CliError::Http)
    } else {
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(crate::CliError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Handles a response without a body.
async fn handle_empty_response(response: reqwest::Response) -> crate::CliResult<()> {
    let status = response.status();

    if status.is_success() {
        Ok(())
    } else {
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(crate::CliError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

//! HTTP client shared by the backend adapters

use reqwest::{Method, RequestBuilder};
use std::time::Duration;

use aa_shared::BackendConfig;

use crate::InfrastructureError;

/// `reqwest` client carrying the project URL and anon key
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, InfrastructureError> {
        if config.url.trim().is_empty() {
            return Err(InfrastructureError::Config("SUPABASE_URL not set".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Request against the auth API, authorized with the anon key
    pub fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.auth_url(), path);
        self.request(method, url, None)
    }

    /// Auth API request on behalf of a signed-in user
    pub fn auth_as(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.auth_url(), path);
        self.request(method, url, Some(access_token))
    }

    /// Request against the REST API for `table`
    pub fn rest(&self, method: Method, table: &str, access_token: Option<&str>) -> RequestBuilder {
        let url = format!("{}/{}", self.config.rest_url(), table);
        self.request(method, url, access_token)
    }

    fn request(&self, method: Method, url: String, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.config.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }
}

//! Unsplash API client
//!
//! Thin reqwest wrapper implementing [`SourceClient`]. Authenticates with the
//! public access key (`Authorization: Client-ID ...`).

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::config::UnsplashConfig;
use super::models::{SourceCollection, SourcePhoto};
use super::source::{SourceClient, SourceError};

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

/// HTTP client for the Unsplash REST API
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    client: Client,
    base_url: String,
    per_page: u32,
}

impl UnsplashClient {
    pub fn new(config: &UnsplashConfig) -> Result<Self, SourceError> {
        if !config.has_access_key() {
            return Err(SourceError::Config("UNSPLASH_ACCESS_KEY is not set".to_string()));
        }

        let mut headers = header::HeaderMap::new();
        let auth = format!("Client-ID {}", config.access_key);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth).map_err(|_| {
                SourceError::Config("access key is not a valid header value".to_string())
            })?,
        );
        headers.insert("Accept-Version", header::HeaderValue::from_static("v1"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("wallpaper-server/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "Unsplash request");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();

        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::RateLimited {
                    status: status.as_u16(),
                })
            },
            StatusCode::NOT_FOUND => return Err(SourceError::NotFound(url)),
            s if !s.is_success() => {
                return Err(SourceError::Status {
                    status: s.as_u16(),
                    url,
                })
            },
            _ => {},
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SourceClient for UnsplashClient {
    async fn search_collections(&self, name: &str) -> Result<Vec<SourceCollection>, SourceError> {
        let response: SearchResponse<SourceCollection> = self
            .get_json(
                "/search/collections",
                &[
                    ("query", name.to_string()),
                    ("page", "1".to_string()),
                    ("per_page", self.per_page.to_string()),
                ],
            )
            .await?;
        Ok(response.results)
    }

    async fn collection_photos(
        &self,
        collection_id: &str,
        page: u32,
    ) -> Result<Vec<SourcePhoto>, SourceError> {
        self.get_json(
            &format!("/collections/{}/photos", collection_id),
            &[
                ("page", page.to_string()),
                ("per_page", self.per_page.to_string()),
            ],
        )
        .await
    }

    async fn latest_collections(&self) -> Result<Vec<SourceCollection>, SourceError> {
        self.get_json(
            "/collections",
            &[
                ("page", "1".to_string()),
                ("per_page", self.per_page.to_string()),
            ],
        )
        .await
    }

    fn per_page(&self) -> u32 {
        self.per_page
    }
}

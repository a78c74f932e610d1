/// Jikan v4 provider (unofficial MyAnimeList API)
///
/// Needs no credentials. Top titles come from `/top/anime`, filtered to
/// currently airing, safe-for-work entries; the payloads under `data` are
/// returned untouched for the normalizer.
use crate::{
    error::{AppError, AppResult},
    services::providers::MetadataSource,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

/// Jikan caps `limit` at 25 per page
const MAX_PAGE_SIZE: usize = 25;

#[derive(Debug, Deserialize)]
struct JikanListResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    #[serde(default)]
    pagination: Option<JikanPagination>,
}

#[derive(Debug, Deserialize)]
struct JikanPagination {
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Clone)]
pub struct JikanClient {
    http_client: HttpClient,
    api_url: String,
}

impl JikanClient {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    async fn fetch_page(&self, page: usize, page_size: usize) -> AppResult<JikanListResponse> {
        let url = format!("{}/top/anime", self.api_url);
        let page = page.to_string();
        let page_size = page_size.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("filter", "airing"),
                ("sfw", "true"),
                ("limit", page_size.as_str()),
                ("page", page.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Jikan API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MetadataSource for JikanClient {
    async fn fetch_top_anime(&self, limit: usize) -> AppResult<Vec<serde_json::Value>> {
        if limit == 0 {
            return Err(AppError::InvalidParameter(
                "Anime limit must be at least 1".to_string(),
            ));
        }

        let page_size = limit.min(MAX_PAGE_SIZE);
        let mut payloads = Vec::with_capacity(limit);
        let mut page = 1;

        while payloads.len() < limit {
            let response = self.fetch_page(page, page_size).await?;
            let received = response.data.len();
            payloads.extend(response.data);

            let has_next = response.pagination.map_or(false, |p| p.has_next_page);
            if received == 0 || !has_next {
                break;
            }
            page += 1;
        }

        payloads.truncate(limit);

        tracing::info!(
            limit = limit,
            results = payloads.len(),
            provider = "jikan",
            "Top anime fetched"
        );

        Ok(payloads)
    }

    fn name(&self) -> &'static str {
        "jikan"
    }
}

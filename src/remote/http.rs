use super::dto::{
    AnalyticsResponse, DetailedAnalyticsResponse, ErrorResponse, RecentClicksResponse,
    ShortenRequest, ShortenResponse,
};
use super::{CreatedLink, DetailedRange, LinkCount, RemoteApi, RemoteError};
use crate::models::click::ClickSample;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// JSON client for the short-link service.
#[derive(Clone)]
pub struct HttpRemote {
    http: Client,
    base: Url,
}

impl HttpRemote {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url)
            .map_err(|e| RemoteError::Validation(format!("invalid api base url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Validation(format!(
                "api base url cannot hold paths: {base_url}"
            )));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| RemoteError::Decode(e.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

/// Maps a non-success status to a failure class by status code alone.
pub fn classify_status(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
            RemoteError::Validation(message)
        }
        other => RemoteError::Server {
            status: other.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn create_link(
        &self,
        url: &str,
        custom_alias: Option<&str>,
    ) -> Result<CreatedLink, RemoteError> {
        let body = ShortenRequest {
            url,
            custom: custom_alias,
        };
        let response = self
            .http
            .post(self.endpoint(&["shorten"]))
            .json(&body)
            .send()
            .await?;
        let created: ShortenResponse = Self::decode(response).await?;
        Ok(CreatedLink {
            short_code: created.short,
            expires_at: Some(created.expires).filter(|ts| *ts > 0),
        })
    }

    async fn visit_count(&self, short_code: &str) -> Result<LinkCount, RemoteError> {
        let response = self
            .http
            .get(self.endpoint(&["analytics", short_code]))
            .send()
            .await?;
        let data: AnalyticsResponse = Self::decode(response).await?;
        Ok(LinkCount {
            short_code: data.short,
            original_url: data.original,
            visit_count: data.visit_count,
        })
    }

    async fn detailed_range(
        &self,
        short_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<DetailedRange, RemoteError> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let response = self
            .http
            .get(self.endpoint(&["analytics", short_code, "detailed"]))
            .query(&[("from", from.as_str()), ("to", to.as_str())])
            .send()
            .await?;
        let data: DetailedAnalyticsResponse = Self::decode(response).await?;
        Ok(DetailedRange {
            daily_clicks: data.daily_clicks,
            mobile_percentage: data.mobile_percentage.min(100),
        })
    }

    async fn recent_clicks(
        &self,
        short_code: &str,
        limit: usize,
    ) -> Result<Vec<ClickSample>, RemoteError> {
        let response = self
            .http
            .get(self.endpoint(&["analytics", short_code, "recent-clicks"]))
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;
        let data: RecentClicksResponse = Self::decode(response).await?;
        let total = data.clicks.len();
        let samples: Vec<ClickSample> = data
            .clicks
            .into_iter()
            .filter_map(|click| click.into_sample())
            .collect();
        if samples.len() < total {
            log::warn!(
                "dropped {} recent clicks for {short_code} with unreadable timestamps",
                total - samples.len()
            );
        }
        Ok(samples)
    }

    fn short_url(&self, short_code: &str) -> String {
        self.endpoint(&["s", short_code]).to_string()
    }
}

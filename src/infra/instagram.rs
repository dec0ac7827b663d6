//! Instagram Graph API media client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{
    application::instagram::{InstagramApi, InstagramError},
    config::InstagramSettings,
    domain::instagram::InstagramPost,
};

const MEDIA_FIELDS: &str = "media_url,permalink,caption,timestamp";
const MEDIA_LIMIT: &str = "12";

pub struct GraphApiClient {
    http: Client,
    media_url: Url,
}

impl GraphApiClient {
    /// `None` unless both the access token and user id are configured;
    /// the service then serves the fallback feed instead.
    pub fn from_settings(settings: &InstagramSettings) -> Option<Self> {
        let (Some(token), Some(user_id)) =
            (settings.access_token.as_ref(), settings.user_id.as_ref())
        else {
            return None;
        };

        let mut media_url =
            Url::parse(&format!("https://graph.instagram.com/{user_id}/media")).ok()?;
        media_url
            .query_pairs_mut()
            .append_pair("fields", MEDIA_FIELDS)
            .append_pair("limit", MEDIA_LIMIT)
            .append_pair("access_token", token);

        let http = Client::builder()
            .timeout(settings.upstream_timeout)
            .build()
            .unwrap_or_default();

        Some(Self { http, media_url })
    }
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    data: Vec<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    media_url: Option<String>,
    permalink: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl RawMedia {
    /// Items missing a media or permalink URL cannot be rendered and are
    /// dropped rather than surfaced as broken tiles.
    fn into_post(self) -> Option<InstagramPost> {
        Some(InstagramPost {
            media_url: self.media_url?,
            permalink: self.permalink?,
            caption: self.caption.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl InstagramApi for GraphApiClient {
    async fn recent_media(&self) -> Result<Vec<InstagramPost>, InstagramError> {
        let response = self
            .http
            .get(self.media_url.clone())
            .send()
            .await
            .map_err(|err| InstagramError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InstagramError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: MediaResponse = response
            .json()
            .await
            .map_err(|err| InstagramError::Decode(err.to_string()))?;

        Ok(payload
            .data
            .into_iter()
            .filter_map(RawMedia::into_post)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn settings(token: Option<&str>, user: Option<&str>) -> InstagramSettings {
        InstagramSettings {
            access_token: token.map(str::to_string),
            user_id: user.map(str::to_string),
            cache_ttl: Duration::from_secs(300),
            upstream_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn both_credentials_are_required() {
        assert!(GraphApiClient::from_settings(&settings(None, None)).is_none());
        assert!(GraphApiClient::from_settings(&settings(Some("tok"), None)).is_none());
        assert!(GraphApiClient::from_settings(&settings(None, Some("42"))).is_none());
        assert!(GraphApiClient::from_settings(&settings(Some("tok"), Some("42"))).is_some());
    }

    #[test]
    fn media_url_carries_fields_and_token() {
        let client =
            GraphApiClient::from_settings(&settings(Some("tok"), Some("42"))).expect("client");
        let url = client.media_url.as_str();
        assert!(url.starts_with("https://graph.instagram.com/42/media?"));
        assert!(url.contains("access_token=tok"));
        assert!(url.contains("media_url%2Cpermalink%2Ccaption%2Ctimestamp"));
    }

    #[test]
    fn items_without_urls_are_dropped() {
        let payload: MediaResponse = serde_json::from_str(
            r#"{"data": [
                {"media_url": "https://cdn/1.jpg", "permalink": "https://ig/p/1",
                 "caption": "studio", "timestamp": "2024-06-01T12:00:00+0000"},
                {"permalink": "https://ig/p/2"},
                {"media_url": "https://cdn/3.jpg"}
            ]}"#,
        )
        .expect("decoded");

        let posts: Vec<_> = payload
            .data
            .into_iter()
            .filter_map(RawMedia::into_post)
            .collect();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].caption, "studio");
    }
}

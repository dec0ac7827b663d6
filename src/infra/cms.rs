//! HTTP client for the headless CMS query API.
//!
//! Two client flavours share the implementation: the public one reads
//! published documents through the CDN edge, the privileged one carries
//! the read token and asks for draft perspective on the live API host.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    application::content::{CmsError, ContentClient},
    config::ContentSettings,
};

pub struct SanityClient {
    http: Client,
    endpoint: Url,
    token: Option<String>,
    draft_perspective: bool,
}

impl SanityClient {
    /// Build the public and privileged clients from settings.
    ///
    /// Without a project id every query answers `Unconfigured`, so the
    /// service still starts and degrades to fallback content. The
    /// privileged client exists only when a read token is present.
    pub fn build_pair(
        settings: &ContentSettings,
    ) -> (Arc<dyn ContentClient>, Option<Arc<dyn ContentClient>>) {
        let Some(project_id) = settings.project_id.as_deref() else {
            return (Arc::new(UnconfiguredClient), None);
        };

        let http = Client::builder()
            .timeout(settings.upstream_timeout)
            .build()
            .unwrap_or_default();

        let public = Arc::new(Self {
            http: http.clone(),
            endpoint: query_endpoint(project_id, settings, "apicdn.sanity.io"),
            token: None,
            draft_perspective: false,
        });

        let privileged = settings.api_token.as_ref().map(|token| {
            Arc::new(Self {
                http,
                endpoint: query_endpoint(project_id, settings, "api.sanity.io"),
                token: Some(token.clone()),
                draft_perspective: true,
            }) as Arc<dyn ContentClient>
        });

        (public, privileged)
    }
}

fn query_endpoint(project_id: &str, settings: &ContentSettings, host: &str) -> Url {
    let candidate = format!(
        "https://{project_id}.{host}/v{version}/data/query/{dataset}",
        version = settings.api_version,
        dataset = settings.dataset,
    );
    // The components are validated configuration values; this parse only
    // fails on a malformed project id, which then behaves as unreachable.
    candidate
        .parse()
        .unwrap_or_else(|_| Url::parse("https://invalid.invalid/").expect("static url"))
}

fn query_url(endpoint: &Url, query: &str, params: &[(&str, &str)], drafts: bool) -> Url {
    let mut url = endpoint.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("query", query);
        for (name, value) in params {
            // GROQ parameters are JSON-encoded values keyed by `$name`.
            pairs.append_pair(&format!("${name}"), &Value::from(*value).to_string());
        }
        if drafts {
            pairs.append_pair("perspective", "previewDrafts");
        }
    }
    url
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

#[async_trait]
impl ContentClient for SanityClient {
    async fn query(&self, query: &str, params: &[(&str, &str)]) -> Result<Value, CmsError> {
        let url = query_url(&self.endpoint, query, params, self.draft_perspective);

        let mut request = self.http.get(url);
        if let Some(token) = self.token.as_ref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| CmsError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: QueryResponse = response
            .json()
            .await
            .map_err(|err| CmsError::Decode(err.to_string()))?;
        Ok(payload.result)
    }
}

/// Stand-in client used when no project id is configured.
struct UnconfiguredClient;

#[async_trait]
impl ContentClient for UnconfiguredClient {
    async fn query(&self, _query: &str, _params: &[(&str, &str)]) -> Result<Value, CmsError> {
        Err(CmsError::Unconfigured)
    }
}

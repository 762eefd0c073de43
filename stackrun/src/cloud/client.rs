//! HTTP client for the cloud stack status API.

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use tracing::debug;

use super::status::CloudStack;
use crate::config::CloudSettings;
use crate::error::CloudError;

pub(crate) const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

/// One page of `GET /v1/stacks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StacksPage {
    #[serde(default)]
    pub stacks: Vec<CloudStack>,
    #[serde(default)]
    pub paginated_result: PaginatedResult,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginatedResult {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// Source of cloud stack states, one page at a time
pub trait StatusSource {
    fn fetch_page(&self, repository: &str, page: u32, per_page: u32) -> Result<StacksPage, CloudError>;
}

/// Fetch every stack of `repository`, following pagination until the
/// reported total is reached or a page comes back empty
pub fn fetch_all(
    source: &dyn StatusSource,
    repository: &str,
    per_page: u32,
) -> Result<Vec<CloudStack>, CloudError> {
    let per_page = per_page.max(1);
    let mut stacks = Vec::new();
    let mut page = 1;

    loop {
        let result = source.fetch_page(repository, page, per_page)?;
        let fetched = result.stacks.len();
        debug!(page, fetched, total = result.paginated_result.total, "fetched cloud stacks");
        stacks.extend(result.stacks);

        if fetched == 0 || stacks.len() as u64 >= result.paginated_result.total {
            break;
        }
        page += 1;
    }

    Ok(stacks)
}

/// Blocking client for the cloud API
pub struct CloudClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl CloudClient {
    pub fn new(settings: &CloudSettings) -> Result<Self, CloudError> {
        let api_url = settings.api_url.as_deref().ok_or(CloudError::MissingApiUrl)?;
        let base = Url::parse(api_url).map_err(|e| CloudError::InvalidUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("stackrun/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CloudError::Http {
                url: api_url.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base,
            token: settings.token.clone(),
        })
    }

    fn stacks_url(&self, repository: &str, page: u32, per_page: u32) -> Result<Url, CloudError> {
        let endpoint = format!("{}/v1/stacks", self.base.as_str().trim_end_matches('/'));
        Url::parse_with_params(
            &endpoint,
            &[
                ("repository", repository.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .map_err(|e| CloudError::InvalidUrl {
            url: endpoint,
            reason: e.to_string(),
        })
    }
}

impl StatusSource for CloudClient {
    fn fetch_page(&self, repository: &str, page: u32, per_page: u32) -> Result<StacksPage, CloudError> {
        let url = self.stacks_url(repository, page, per_page)?;
        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|source| CloudError::Http {
            url: url.to_string(),
            source,
        })?;
        if !response.status().is_success() {
            return Err(CloudError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.json().map_err(|source| CloudError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

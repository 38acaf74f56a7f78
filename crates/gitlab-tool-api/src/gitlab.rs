//! GitLab REST API v4 client

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use gitlab_tool_core::Config;

use crate::error::{FetchError, Result};
use crate::traits::HostingApi;
use crate::types::{
    MergeRequestQuery, MergeRequestRef, Page, Project, TagQuery, TagRef, WireTag,
};

const NEXT_PAGE_HEADER: &str = "x-next-page";
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const GROUP_PROJECTS_PER_PAGE: u32 = 100;
const USER_AGENT: &str = concat!("gitlab-tool/", env!("CARGO_PKG_VERSION"));

/// GitLab API client
pub struct GitLabClient {
    client: Client,
    api_base: Url,
    token: Option<String>,
}

impl GitLabClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let api_base = api_base_url(base_url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_base,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Create a client from resolved configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.gitlab_url,
            config.gitlab_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// The `/api/v4/` URL requests are made against
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Build an endpoint URL. Each segment is percent-encoded on its own,
    /// so `infra/api` becomes `infra%2Fapi` as GitLab expects for ids.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make an authenticated GET request
    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<(T, Option<u32>)> {
        debug!("GitLab API request: GET {}", url);

        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_page);

        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body)?;
        Ok((value, next_page))
    }
}

#[async_trait::async_trait]
impl HostingApi for GitLabClient {
    #[instrument(skip(self))]
    async fn group_projects(&self, group: &str) -> Result<Vec<Project>> {
        let url = self.endpoint(&["groups", group, "projects"])?;
        let mut projects = Vec::new();
        let mut page = 1;

        loop {
            let params = [
                ("page", page.to_string()),
                ("per_page", GROUP_PROJECTS_PER_PAGE.to_string()),
            ];
            let (items, next_page): (Vec<Project>, _) = self.get(url.clone(), &params).await?;
            let empty = items.is_empty();
            projects.extend(items);

            match next_page {
                Some(next) if next > page && !empty => page = next,
                _ => break,
            }
        }

        debug!(count = projects.len(), "fetched group projects");
        Ok(projects)
    }

    #[instrument(skip(self, query), fields(page = query.page, per_page = query.per_page))]
    async fn list_tags(&self, project: &str, query: &TagQuery) -> Result<Page<TagRef>> {
        let url = self.endpoint(&["projects", project, "repository", "tags"])?;
        let params = [
            ("order_by", "updated".to_string()),
            ("sort", "desc".to_string()),
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        let (tags, next_page): (Vec<WireTag>, _) = self.get(url, &params).await?;
        Ok(Page {
            items: tags.into_iter().map(TagRef::from).collect(),
            next_page,
        })
    }

    #[instrument(skip(self, query), fields(target = %query.target_branch, page = query.page))]
    async fn list_merge_requests(
        &self,
        project: &str,
        query: &MergeRequestQuery,
    ) -> Result<Page<MergeRequestRef>> {
        let url = self.endpoint(&["projects", project, "merge_requests"])?;
        let params = [
            ("state", "merged".to_string()),
            ("order_by", "created_at".to_string()),
            ("sort", "desc".to_string()),
            ("target_branch", query.target_branch.clone()),
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        let (items, next_page): (Vec<MergeRequestRef>, _) = self.get(url, &params).await?;
        debug!(count = items.len(), ?next_page, "fetched merge request page");
        Ok(Page { items, next_page })
    }
}

/// `https://host/prefix` -> `https://host/prefix/api/v4/`
fn api_base_url(base_url: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let url = Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;
    if url.cannot_be_a_base() {
        return Err(FetchError::InvalidUrl(base));
    }
    url.join("api/v4/")
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))
}

/// GitLab sends an empty `X-Next-Page` on the last page
fn parse_next_page(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|p| *p > 0)
}

//! In-memory [`HostingApi`] for tests
//!
//! Serves fixed projects, tags and merge requests with GitLab-like paging:
//! a page's `next_page` is set while more items remain.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::error::{FetchError, Result};
use crate::traits::HostingApi;
use crate::types::{MergeRequestQuery, MergeRequestRef, Page, Project, TagQuery, TagRef};

/// Build a merged merge request with predictable fields
pub fn merge_request(id: u64, source: &str, target: &str, merge_sha: &str) -> MergeRequestRef {
    MergeRequestRef {
        id,
        iid: id,
        title: format!("Change {}", id),
        source_branch: source.to_string(),
        target_branch: target.to_string(),
        state: "merged".to_string(),
        created_at: Utc.timestamp_opt(1_700_000_000 - id as i64 * 60, 0).unwrap(),
        head_sha: format!("head-{}", id),
        merge_commit_sha: Some(merge_sha.to_string()),
        web_url: None,
    }
}

/// Fake hosting platform
#[derive(Default)]
pub struct InMemoryApi {
    projects: HashMap<String, Vec<Project>>,
    tags: Vec<TagRef>,
    merge_requests: HashMap<String, Vec<MergeRequestRef>>,
    fail_from_page: Option<u32>,
    stuck_next_page: bool,
    latency: Option<Duration>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(mut self, group: &str, projects: Vec<Project>) -> Self {
        self.projects.insert(group.to_string(), projects);
        self
    }

    pub fn with_tags(mut self, tags: Vec<TagRef>) -> Self {
        self.tags = tags;
        self
    }

    /// Merge requests into `target`, newest first
    pub fn with_merge_requests(mut self, target: &str, mrs: Vec<MergeRequestRef>) -> Self {
        self.merge_requests.insert(target.to_string(), mrs);
        self
    }

    /// Every listing call for `page >= n` fails with a 500
    pub fn failing_from_page(mut self, page: u32) -> Self {
        self.fail_from_page = Some(page);
        self
    }

    /// Report the current page as the next page
    pub fn with_stuck_next_page(mut self) -> Self {
        self.stuck_next_page = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// `(target_branch, page)` for every merge request listing served
    pub fn merge_request_requests(&self) -> Vec<(String, u32)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    async fn simulate(&self, page: u32) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_from_page.is_some_and(|n| page >= n) {
            return Err(FetchError::Api {
                status: 500,
                message: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn paginate<T: Clone>(&self, items: &[T], page: u32, per_page: u32) -> Page<T> {
        let per_page = per_page.max(1) as usize;
        let start = (page.saturating_sub(1) as usize) * per_page;
        let end = (start + per_page).min(items.len());
        let slice = if start < items.len() {
            items[start..end].to_vec()
        } else {
            Vec::new()
        };
        let next_page = if self.stuck_next_page {
            Some(page)
        } else if end < items.len() {
            Some(page + 1)
        } else {
            None
        };
        Page {
            items: slice,
            next_page,
        }
    }
}

#[async_trait::async_trait]
impl HostingApi for InMemoryApi {
    async fn group_projects(&self, group: &str) -> Result<Vec<Project>> {
        self.simulate(1).await?;
        self.projects
            .get(group)
            .cloned()
            .ok_or_else(|| FetchError::Api {
                status: 404,
                message: format!("404 Group {} Not Found", group),
            })
    }

    async fn list_tags(&self, _project: &str, query: &TagQuery) -> Result<Page<TagRef>> {
        self.simulate(query.page).await?;
        Ok(self.paginate(&self.tags, query.page, query.per_page))
    }

    async fn list_merge_requests(
        &self,
        _project: &str,
        query: &MergeRequestQuery,
    ) -> Result<Page<MergeRequestRef>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((query.target_branch.clone(), query.page));
        }
        self.simulate(query.page).await?;
        let items = self
            .merge_requests
            .get(&query.target_branch)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(self.paginate(items, query.page, query.per_page))
    }
}

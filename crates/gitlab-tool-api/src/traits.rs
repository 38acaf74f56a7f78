//! Hosting platform capability trait

use crate::error::Result;
use crate::types::{MergeRequestQuery, MergeRequestRef, Page, Project, TagQuery, TagRef};

/// The subset of a GitLab-style API the tool consumes
///
/// Implementations are expected to perform one request per call; callers
/// drive pagination themselves (see [`crate::MergeRequestPager`]).
#[async_trait::async_trait]
pub trait HostingApi: Send + Sync {
    /// Projects belonging to a group, addressed by its full path
    async fn group_projects(&self, group: &str) -> Result<Vec<Project>>;

    /// One page of a project's tags
    async fn list_tags(&self, project: &str, query: &TagQuery) -> Result<Page<TagRef>>;

    /// One page of merged merge requests into `query.target_branch`,
    /// newest created first
    async fn list_merge_requests(
        &self,
        project: &str,
        query: &MergeRequestQuery,
    ) -> Result<Page<MergeRequestRef>>;
}

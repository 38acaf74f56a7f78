//! Release correlation over merged merge requests
//!
//! Releases are promoted by merging the main branch into a staging branch.
//! The most recent such promotion marks what has already shipped: every
//! merge into the main branch after the promoted commit is new.
//!
//! 1. The latest tag is fetched as an anchor (reported only).
//! 2. Merges into the staging branch are walked until one comes from the
//!    main branch: the promotion candidate.
//! 3. Merges into the main branch are collected until the one whose merge
//!    commit is the candidate's head commit: the boundary.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument};

use gitlab_tool_api::{
    Deadline, FetchError, HostingApi, MergeRequestPager, MergeRequestRef, TagQuery, TagRef,
};
use gitlab_tool_core::{BranchConfig, PaginationConfig};

use crate::deriver::ChangesProvider;
use crate::types::ChangelogRecord;

/// Change line used when nothing was merged since the last promotion
pub const NO_RECENT_MERGES: &str = "  * no recent merges";

/// Outcome of one correlation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correlation {
    /// Most recently updated tag
    pub anchor_tag: Option<TagRef>,
    /// Last merge of the main branch into the staging branch
    pub promotion: Option<MergeRequestRef>,
    /// Merge into the main branch that the promotion shipped
    pub boundary: Option<MergeRequestRef>,
    /// Merges into the main branch newer than the boundary, newest first
    pub changes: Vec<MergeRequestRef>,
}

impl Correlation {
    /// Whether the walk stopped at a promotion boundary
    pub fn boundary_found(&self) -> bool {
        self.boundary.is_some()
    }

    /// Changelog lines, one per merge request
    pub fn change_text(&self) -> String {
        if self.changes.is_empty() {
            return NO_RECENT_MERGES.to_string();
        }
        self.changes
            .iter()
            .map(change_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `  * <title> (!<iid>, <short hash>)`
pub fn change_line(mr: &MergeRequestRef) -> String {
    format!("  * {} (!{}, {})", mr.title.trim(), mr.iid, mr.short_hash())
}

/// Walks merge request listings of one hosting platform
pub struct ReleaseCorrelator<'a> {
    api: &'a dyn HostingApi,
    branches: BranchConfig,
    pagination: PaginationConfig,
    deadline: Deadline,
}

impl<'a> ReleaseCorrelator<'a> {
    pub fn new(api: &'a dyn HostingApi, branches: BranchConfig, pagination: PaginationConfig) -> Self {
        Self {
            api,
            branches,
            pagination,
            deadline: Deadline::none(),
        }
    }

    /// Abandon the walk with [`FetchError::Timeout`] once `deadline` passes
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Correlate the merges of `project`. Any failed page fetch aborts the
    /// whole run.
    #[instrument(skip(self), fields(main = %self.branches.main, staging = %self.branches.staging))]
    pub async fn correlate(&self, project: &str) -> Result<Correlation, FetchError> {
        let anchor_tag = self
            .deadline
            .run("latest tag", self.api.list_tags(project, &TagQuery::latest()))
            .await?
            .items
            .into_iter()
            .next();
        debug!(tag = ?anchor_tag.as_ref().map(|t| &t.name), "anchor tag");

        let main = self.branches.main.as_str();
        let mut staging = MergeRequestPager::new(
            self.api,
            project,
            &self.branches.staging,
            self.pagination.staging_page_size,
            self.deadline,
        );
        let promotion = staging.find(|mr| mr.source_branch == main).await?;
        match &promotion {
            Some(mr) => debug!(iid = mr.iid, head = %mr.head_sha, "promotion candidate"),
            None => debug!(
                pages = staging.pages_fetched(),
                "no promotion into the staging branch"
            ),
        }

        let promoted_head = promotion.as_ref().map(|mr| mr.head_sha.as_str());
        let mut mainline = MergeRequestPager::new(
            self.api,
            project,
            main,
            self.pagination.main_page_size,
            self.deadline,
        );
        let (changes, boundary) = mainline
            .take_until(|mr| {
                promoted_head.is_some_and(|head| mr.merge_commit_sha.as_deref() == Some(head))
            })
            .await?;

        info!(
            changes = changes.len(),
            boundary = boundary.is_some(),
            pages = mainline.pages_fetched(),
            "correlated merge requests"
        );

        Ok(Correlation {
            anchor_tag,
            promotion,
            boundary,
            changes,
        })
    }
}

/// [`ChangesProvider`] backed by a correlation of one project
pub struct ReleaseChanges<'a> {
    correlator: ReleaseCorrelator<'a>,
    project: String,
}

impl<'a> ReleaseChanges<'a> {
    pub fn new(correlator: ReleaseCorrelator<'a>, project: impl Into<String>) -> Self {
        Self {
            correlator,
            project: project.into(),
        }
    }
}

#[async_trait]
impl ChangesProvider for ReleaseChanges<'_> {
    async fn changes(&self, _previous: Option<&ChangelogRecord>) -> Result<String, FetchError> {
        let correlation = self.correlator.correlate(&self.project).await?;
        Ok(correlation.change_text())
    }
}

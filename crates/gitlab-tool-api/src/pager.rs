//! Lazy pagination over merged merge requests
//!
//! A [`MergeRequestPager`] yields merge requests one at a time, fetching a
//! new page only when the buffered one is drained. It is finite and cannot be
//! restarted: once the listing is exhausted every further call returns
//! `None`.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};
use crate::traits::HostingApi;
use crate::types::{MergeRequestQuery, MergeRequestRef};

/// Point in time after which fetches are abandoned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline
    pub fn none() -> Self {
        Self(None)
    }

    /// Expire `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }

    /// Await `fut`, failing with [`FetchError::Timeout`] once the deadline passes
    pub async fn run<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.0 {
            Some(at) => tokio::time::timeout_at(at, fut)
                .await
                .map_err(|_| FetchError::Timeout(what.to_string()))?,
            None => fut.await,
        }
    }
}

/// Lazy sequence of merged merge requests into one branch
pub struct MergeRequestPager<'a> {
    api: &'a dyn HostingApi,
    project: String,
    query: MergeRequestQuery,
    buffer: VecDeque<MergeRequestRef>,
    next_page: Option<u32>,
    deadline: Deadline,
    pages_fetched: u32,
}

impl<'a> MergeRequestPager<'a> {
    /// Start at page 1 of merged merge requests into `target_branch`
    pub fn new(
        api: &'a dyn HostingApi,
        project: impl Into<String>,
        target_branch: impl Into<String>,
        per_page: u32,
        deadline: Deadline,
    ) -> Self {
        Self {
            api,
            project: project.into(),
            query: MergeRequestQuery::merged_into(target_branch, per_page),
            buffer: VecDeque::new(),
            next_page: Some(1),
            deadline,
            pages_fetched: 0,
        }
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Whether the listing has been fully consumed
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_empty() && self.next_page.is_none()
    }

    /// Next merge request, fetching another page if needed
    pub async fn next(&mut self) -> Result<Option<MergeRequestRef>> {
        loop {
            if let Some(mr) = self.buffer.pop_front() {
                return Ok(Some(mr));
            }

            let Some(page) = self.next_page else {
                return Ok(None);
            };

            self.fetch(page).await?;
        }
    }

    async fn fetch(&mut self, page: u32) -> Result<()> {
        self.query.page = page;
        let what = format!(
            "merge requests into {} (page {})",
            self.query.target_branch, page
        );
        let result = self
            .deadline
            .run(
                &what,
                self.api.list_merge_requests(&self.project, &self.query),
            )
            .await?;
        self.pages_fetched += 1;

        self.next_page = match result.next_page {
            _ if result.items.is_empty() => None,
            Some(next) if next > page => Some(next),
            Some(next) => {
                warn!(page, next, "server returned a non-advancing next page, stopping");
                None
            }
            None => None,
        };

        debug!(
            page,
            count = result.items.len(),
            next_page = ?self.next_page,
            "buffered merge request page"
        );
        self.buffer.extend(result.items);
        Ok(())
    }

    /// Consume until the first merge request matching `predicate`
    pub async fn find<P>(&mut self, mut predicate: P) -> Result<Option<MergeRequestRef>>
    where
        P: FnMut(&MergeRequestRef) -> bool,
    {
        while let Some(mr) = self.next().await? {
            if predicate(&mr) {
                return Ok(Some(mr));
            }
        }
        Ok(None)
    }

    /// Collect merge requests until one matches `stop`.
    ///
    /// The matching merge request is returned separately and is not part of
    /// the collected list. If nothing matches, every remaining merge request
    /// is collected and the stop value is `None`.
    pub async fn take_until<P>(
        &mut self,
        mut stop: P,
    ) -> Result<(Vec<MergeRequestRef>, Option<MergeRequestRef>)>
    where
        P: FnMut(&MergeRequestRef) -> bool,
    {
        let mut collected = Vec::new();
        while let Some(mr) = self.next().await? {
            if stop(&mr) {
                return Ok((collected, Some(mr)));
            }
            collected.push(mr);
        }
        Ok((collected, None))
    }
}

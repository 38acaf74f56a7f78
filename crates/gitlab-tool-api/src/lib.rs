//! gitlab-tool API - hosting platform access
//!
//! This crate defines the [`HostingApi`] capability set consumed by the
//! tool, a GitLab v4 implementation over `reqwest`, and a lazy pager for
//! walking merged merge requests under a caller-supplied deadline.

pub mod error;
mod gitlab;
mod pager;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod traits;
pub mod types;

pub use error::{FetchError, Result};
pub use gitlab::GitLabClient;
pub use pager::{Deadline, MergeRequestPager};
pub use traits::HostingApi;
pub use types::{
    MergeRequestQuery, MergeRequestRef, Page, Project, TagQuery, TagRef,
};

//! Hosting platform types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project in a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    /// Full path including the group, e.g. `infra/api`
    pub path_with_namespace: String,
    #[serde(default)]
    pub http_url_to_repo: Option<String>,
    #[serde(default)]
    pub ssh_url_to_repo: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// A repository tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRef {
    /// Tag name
    pub name: String,
    /// Commit hash the tag points to
    pub commit_hash: String,
    /// Creation time of the tagged commit
    pub created_at: Option<DateTime<Utc>>,
    /// Release notes attached to the tag
    pub release: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTag {
    name: String,
    commit: WireCommit,
    #[serde(default)]
    release: Option<WireRelease>,
}

#[derive(Debug, Deserialize)]
struct WireCommit {
    id: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireRelease {
    #[serde(default)]
    description: Option<String>,
}

impl From<WireTag> for TagRef {
    fn from(tag: WireTag) -> Self {
        Self {
            name: tag.name,
            commit_hash: tag.commit.id,
            created_at: tag.commit.created_at,
            release: tag.release.and_then(|r| r.description),
        }
    }
}

/// A merge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequestRef {
    /// Instance-wide id
    pub id: u64,
    /// Project-scoped id (`!iid`)
    pub iid: u64,
    pub title: String,
    pub source_branch: String,
    pub target_branch: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    /// Head commit of the source branch when merged
    #[serde(rename = "sha")]
    pub head_sha: String,
    /// Commit created by the merge (absent for fast-forward merges)
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

impl MergeRequestRef {
    /// The hash that identifies this merge on its target branch
    pub fn identifying_hash(&self) -> &str {
        self.merge_commit_sha.as_deref().unwrap_or(&self.head_sha)
    }

    /// First 8 characters of the identifying hash
    pub fn short_hash(&self) -> String {
        self.identifying_hash().chars().take(8).collect()
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Next page number; `None` once the listing is exhausted
    pub next_page: Option<u32>,
}

/// Parameters for listing tags, most recently updated first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    pub page: u32,
    pub per_page: u32,
}

impl TagQuery {
    /// The single most recently updated tag
    pub fn latest() -> Self {
        Self {
            per_page: 1,
            ..Self::default()
        }
    }
}

impl Default for TagQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

/// Parameters for listing merged merge requests into one branch,
/// newest created first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequestQuery {
    pub target_branch: String,
    pub page: u32,
    pub per_page: u32,
}

impl MergeRequestQuery {
    pub fn merged_into(target_branch: impl Into<String>, per_page: u32) -> Self {
        Self {
            target_branch: target_branch.into(),
            page: 1,
            per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_wire() {
        let json = r#"{
            "name": "v1.2.0",
            "commit": {"id": "abc123", "created_at": "2024-01-02T15:04:05+01:00"},
            "release": {"tag_name": "v1.2.0", "description": "notes"}
        }"#;
        let wire: WireTag = serde_json::from_str(json).unwrap();
        let tag = TagRef::from(wire);
        assert_eq!(tag.name, "v1.2.0");
        assert_eq!(tag.commit_hash, "abc123");
        assert_eq!(tag.release.as_deref(), Some("notes"));
        assert_eq!(
            tag.created_at.unwrap().to_rfc3339(),
            "2024-01-02T14:04:05+00:00"
        );
    }

    #[test]
    fn test_tag_without_release() {
        let json = r#"{"name": "v1", "commit": {"id": "abc"}, "release": null}"#;
        let tag = TagRef::from(serde_json::from_str::<WireTag>(json).unwrap());
        assert!(tag.release.is_none());
        assert!(tag.created_at.is_none());
    }

    #[test]
    fn test_merge_request_identifying_hash() {
        let json = r#"{
            "id": 10, "iid": 3, "title": "Add thing",
            "source_branch": "feature", "target_branch": "master",
            "state": "merged", "created_at": "2024-01-02T15:04:05Z",
            "sha": "headheadhead", "merge_commit_sha": null
        }"#;
        let mut mr: MergeRequestRef = serde_json::from_str(json).unwrap();
        assert_eq!(mr.identifying_hash(), "headheadhead");

        mr.merge_commit_sha = Some("1234567890abcdef".to_string());
        assert_eq!(mr.short_hash(), "12345678");
    }
}

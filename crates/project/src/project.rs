use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use pixelproof_core::{DomainError, DomainResult, Entity, ProjectId};

/// Maximum accepted length of a project name.
pub const MAX_NAME_LEN: usize = 100;

/// Project status lifecycle.
///
/// A project starts `Created`; the capture worker drives it through
/// `Running` to a terminal state while snapshots execute against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Created,
    Queued,
    Running,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl ProjectStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Completed | ProjectStatus::Failed | ProjectStatus::Cancelled
        )
    }
}

/// A monitored target: unique name plus the URL to capture.
///
/// Construct via [`Project::create`] (validating) or [`Project::restore`]
/// (trusted storage rehydration, no validation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    uuid: ProjectId,
    name: String,
    url: String,
    status: ProjectStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Validating constructor: the only way a new project enters the system.
    pub fn create(name: impl Into<String>, url: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let url = url.into();
        validate_name(&name)?;
        validate_url(&url)?;

        let now = Utc::now();
        Ok(Self {
            uuid: ProjectId::new(),
            name,
            url,
            status: ProjectStatus::Created,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a project from trusted storage.
    ///
    /// Restores every field verbatim, including status and timestamps, and
    /// runs **no validation**. Reserved for repository rehydration.
    pub fn restore(
        uuid: ProjectId,
        name: String,
        url: String,
        status: ProjectStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid,
            name,
            url,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn uuid(&self) -> ProjectId {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Move to a new lifecycle status, refreshing `updated_at`.
    pub fn update_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.uuid
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name is required"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(
            "name must be 100 characters or less",
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::validation(
            "name must be alphanumeric with dashes and underscores only",
        ));
    }
    Ok(())
}

fn validate_url(raw: &str) -> DomainResult<()> {
    let parsed = Url::parse(raw).map_err(|_| DomainError::validation("invalid URL format"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(DomainError::validation("URL must use http or https")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sets_initial_lifecycle() {
        let project = Project::create("my-site", "https://example.com").unwrap();

        assert_eq!(project.name(), "my-site");
        assert_eq!(project.url(), "https://example.com");
        assert_eq!(project.status(), ProjectStatus::Created);
        assert_eq!(project.created_at(), project.updated_at());
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Project::create("", "https://example.com").unwrap_err();
        assert_eq!(err, DomainError::validation("name is required"));

        let err = Project::create("   ", "https://example.com").unwrap_err();
        assert_eq!(err, DomainError::validation("name is required"));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "a".repeat(101);
        let err = Project::create(name, "https://example.com").unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("name must be 100 characters or less")
        );

        // Exactly at the limit is fine.
        assert!(Project::create("a".repeat(100), "https://example.com").is_ok());
    }

    #[test]
    fn name_charset_is_enforced() {
        let err = Project::create("bad name!", "https://example.com").unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("name must be alphanumeric with dashes and underscores only")
        );

        assert!(Project::create("ok_name-123", "https://example.com").is_ok());
    }

    #[test]
    fn unparseable_url_is_rejected() {
        let err = Project::create("site", "not a url").unwrap_err();
        assert_eq!(err, DomainError::validation("invalid URL format"));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err = Project::create("site", "ftp://example.com").unwrap_err();
        assert_eq!(err, DomainError::validation("URL must use http or https"));
    }

    #[test]
    fn update_status_refreshes_updated_at() {
        let mut project = Project::create("site", "http://example.com").unwrap();
        let before = project.updated_at();

        project.update_status(ProjectStatus::Running);

        assert_eq!(project.status(), ProjectStatus::Running);
        assert!(project.updated_at() >= before);
        assert_eq!(project.created_at(), before);
    }

    #[test]
    fn restore_bypasses_validation() {
        // A name that `create` would reject still rehydrates untouched.
        let id = ProjectId::new();
        let created = Utc::now();
        let project = Project::restore(
            id,
            "legacy name with spaces".to_string(),
            "https://example.com".to_string(),
            ProjectStatus::Failed,
            created,
            created,
        );

        assert_eq!(project.uuid(), id);
        assert_eq!(project.name(), "legacy name with spaces");
        assert_eq!(project.status(), ProjectStatus::Failed);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every valid name/url pair constructs a `Created`
            /// project with equal timestamps.
            #[test]
            fn valid_inputs_always_construct(
                name in "[A-Za-z0-9_-]{1,100}",
                host in "[a-z]{1,20}",
                https in any::<bool>(),
            ) {
                let scheme = if https { "https" } else { "http" };
                let url = format!("{scheme}://{host}.example.com/page");

                let project = Project::create(name.clone(), url.clone()).unwrap();
                prop_assert_eq!(project.name(), name.as_str());
                prop_assert_eq!(project.url(), url.as_str());
                prop_assert_eq!(project.status(), ProjectStatus::Created);
                prop_assert_eq!(project.created_at(), project.updated_at());
            }

            /// Property: a name containing any character outside the allowed
            /// set is rejected with the charset rule.
            #[test]
            fn invalid_charset_always_rejected(
                prefix in "[A-Za-z0-9_-]{0,10}",
                bad in "[!@#$%^&*()+=.,/\\\\]",
                suffix in "[A-Za-z0-9_-]{0,10}",
            ) {
                let name = format!("{prefix}{bad}{suffix}");
                let err = Project::create(name, "https://example.com").unwrap_err();
                prop_assert_eq!(
                    err,
                    DomainError::validation(
                        "name must be alphanumeric with dashes and underscores only"
                    )
                );
            }
        }
    }
}

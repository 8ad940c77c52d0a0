//! The five step resource group lifecycle and its cleanup guarantee.
//!
//! A run walks `CreatePrimary → TagPrimary → CreateSecondary → List → DeleteSecondary`
//! and stops at the first failing step. Whatever happened, deletion of the primary
//! group is then submitted exactly once. The secondary group is only deleted on the
//! success path.

use std::fmt;
use std::sync::Arc;

use azs_core::provisioning::ResourceGroupProvisioner;
use azs_core::Error;
use tracing::{error, info, warn};

use crate::session::ProvisioningSession;

/// One forward step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Create the primary resource group
    CreatePrimary,
    /// Apply the generated tag to the primary group
    TagPrimary,
    /// Create the secondary resource group
    CreateSecondary,
    /// List every resource group in the subscription
    List,
    /// Submit deletion of the secondary group
    DeleteSecondary,
}

impl Step {
    /// Stable lowercase name used in logs and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatePrimary => "create_primary",
            Self::TagPrimary => "tag_primary",
            Self::CreateSecondary => "create_secondary",
            Self::List => "list",
            Self::DeleteSecondary => "delete_secondary",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forward step raised; the run stopped there.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("step `{step}` failed: {source}")]
pub struct StepError {
    /// The step that failed
    pub step: Step,
    /// What the remote call reported
    pub source: Error,
}

/// What happened to the guaranteed deletion of the primary group.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanupOutcome {
    /// The service accepted the deletion
    Submitted,
    /// There was no client or session, so nothing could have been created
    Skipped,
    /// The deletion request itself failed
    Failed(Error),
}

impl CleanupOutcome {
    /// Stable lowercase name used in logs and responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcome of one orchestrator run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// First forward step that failed, if any
    pub failure: Option<StepError>,
    /// Resource group names seen by the `List` step, in listing order
    pub observed_groups: Vec<String>,
    /// Result of the primary group cleanup
    pub cleanup: CleanupOutcome,
    /// Names used by the run; `None` when no client was available
    pub session: Option<ProvisioningSession>,
}

impl RunReport {
    /// True only if every forward step through `DeleteSecondary` completed.
    ///
    /// The cleanup outcome does not affect this.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none() && self.session.is_some()
    }
}

/// Runs the provisioning lifecycle against a [`ResourceGroupProvisioner`].
pub struct LifecycleOrchestrator {
    client: Option<Arc<dyn ResourceGroupProvisioner>>,
    location: String,
}

impl LifecycleOrchestrator {
    /// Create an orchestrator that provisions in `location`.
    #[must_use]
    pub fn new(client: Arc<dyn ResourceGroupProvisioner>, location: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            location: location.into(),
        }
    }

    /// Create an orchestrator for a run whose client could not be built.
    ///
    /// Such a run creates nothing and reports [`CleanupOutcome::Skipped`].
    #[must_use]
    pub fn without_client(location: impl Into<String>) -> Self {
        Self {
            client: None,
            location: location.into(),
        }
    }

    /// Target location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Run with freshly generated names and return whether every step succeeded.
    pub async fn run(&self) -> bool {
        self.execute().await.succeeded()
    }

    /// Run with freshly generated names.
    pub async fn execute(&self) -> RunReport {
        self.execute_with_session(ProvisioningSession::generate())
            .await
    }

    /// Run with the given names.
    ///
    /// Step failures are captured in the report, never returned.
    pub async fn execute_with_session(&self, session: ProvisioningSession) -> RunReport {
        let Some(client) = self.client.as_deref() else {
            info!("Did not create any resources, no clean up is necessary");
            return RunReport {
                failure: None,
                observed_groups: Vec::new(),
                cleanup: CleanupOutcome::Skipped,
                session: None,
            };
        };

        let mut observed_groups = Vec::new();
        let failure = self
            .forward(client, &session, &mut observed_groups)
            .await
            .err();

        if let Some(err) = &failure {
            error!(step = %err.step, error = %err.source, "Provisioning step failed");
        }

        let cleanup = cleanup(client, &session.primary_group).await;

        RunReport {
            failure,
            observed_groups,
            cleanup,
            session: Some(session),
        }
    }

    async fn forward(
        &self,
        client: &dyn ResourceGroupProvisioner,
        session: &ProvisioningSession,
        observed_groups: &mut Vec<String>,
    ) -> Result<(), StepError> {
        let primary = &session.primary_group;
        let secondary = &session.secondary_group;

        info!(name = %primary, location = %self.location, "Creating a resource group");
        client
            .create_resource_group(&session.primary_spec(&self.location))
            .await
            .map_err(at(Step::CreatePrimary))?;
        info!(name = %primary, "Created a resource group");

        info!(name = %primary, "Updating the resource group");
        client
            .update_resource_group_tags(primary, &session.tags())
            .await
            .map_err(at(Step::TagPrimary))?;
        info!(name = %primary, "Updated the resource group");

        info!(name = %secondary, "Creating another resource group");
        client
            .create_resource_group(&session.secondary_spec(&self.location))
            .await
            .map_err(at(Step::CreateSecondary))?;
        info!(name = %secondary, "Created another resource group");

        info!("Listing all resource groups");
        let groups = client
            .list_resource_groups()
            .await
            .map_err(at(Step::List))?;
        for group in groups {
            info!(name = %group.name, "Resource group");
            observed_groups.push(group.name);
        }

        info!(name = %secondary, "Deleting resource group");
        client
            .submit_delete_resource_group(secondary)
            .await
            .map_err(at(Step::DeleteSecondary))?;

        Ok(())
    }
}

fn at(step: Step) -> impl FnOnce(Error) -> StepError {
    move |source| StepError { step, source }
}

async fn cleanup(client: &dyn ResourceGroupProvisioner, primary: &str) -> CleanupOutcome {
    info!(name = %primary, "Deleting resource group");
    match client.submit_delete_resource_group(primary).await {
        Ok(()) => CleanupOutcome::Submitted,
        Err(err) => {
            if err.is_not_found() {
                warn!(name = %primary, "Resource group was never created");
            } else {
                warn!(name = %primary, error = %err, "Cleanup deletion failed");
            }
            CleanupOutcome::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azs_core::types::{ResourceGroup, ResourceGroupSpec, Tags};
    use mockall::predicate::eq;
    use mockall::{mock, Sequence};

    mock! {
        Provisioner {}

        #[async_trait::async_trait]
        impl ResourceGroupProvisioner for Provisioner {
            async fn create_resource_group(
                &self,
                spec: &ResourceGroupSpec,
            ) -> azs_core::Result<ResourceGroup>;
            async fn update_resource_group_tags(
                &self,
                name: &str,
                tags: &Tags,
            ) -> azs_core::Result<ResourceGroup>;
            async fn list_resource_groups(&self) -> azs_core::Result<Vec<ResourceGroup>>;
            async fn submit_delete_resource_group(&self, name: &str) -> azs_core::Result<()>;
        }
    }

    fn session() -> ProvisioningSession {
        ProvisioningSession::new("rgRSMA-one", "rgRSMA-two", "rgRSTN-k", "rgRSTV-v")
    }

    fn group(name: &str) -> ResourceGroup {
        ResourceGroup {
            id: format!("/subscriptions/sub/resourcegroups/{name}"),
            name: name.to_string(),
            location: "local".to_string(),
            tags: Tags::new(),
            provisioning_state: Some("Succeeded".to_string()),
        }
    }

    fn orchestrator(mock: MockProvisioner) -> LifecycleOrchestrator {
        LifecycleOrchestrator::new(Arc::new(mock), "local")
    }

    #[tokio::test]
    async fn tag_failure_still_deletes_primary_only() {
        let mut mock = MockProvisioner::new();
        mock.expect_create_resource_group()
            .withf(|spec| spec.name == "rgRSMA-one" && spec.location == "local")
            .times(1)
            .returning(|spec| Ok(group(&spec.name)));
        mock.expect_update_resource_group_tags()
            .withf(|name, tags| name == "rgRSMA-one" && tags.get("rgRSTN-k").is_some())
            .times(1)
            .returning(|_, _| Err(Error::Conflict("tag update rejected".to_string())));
        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA-one"))
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA-two"))
            .never();

        let report = orchestrator(mock).execute_with_session(session()).await;

        assert!(!report.succeeded());
        assert_eq!(report.failure.map(|f| f.step), Some(Step::TagPrimary));
        assert_eq!(report.cleanup, CleanupOutcome::Submitted);
        assert!(report.observed_groups.is_empty());
    }

    #[tokio::test]
    async fn failed_first_create_still_attempts_cleanup() {
        let mut mock = MockProvisioner::new();
        mock.expect_create_resource_group()
            .times(1)
            .returning(|_| Err(Error::BadRequest("InvalidLocation".to_string())));
        mock.expect_update_resource_group_tags().never();
        mock.expect_list_resource_groups().never();
        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA-one"))
            .times(1)
            .returning(|name| Err(Error::NotFound(name.to_string())));

        let report = orchestrator(mock).execute_with_session(session()).await;

        assert!(!report.succeeded());
        assert_eq!(report.failure.map(|f| f.step), Some(Step::CreatePrimary));
        assert!(matches!(report.cleanup, CleanupOutcome::Failed(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn failed_second_create_never_deletes_secondary() {
        let mut mock = MockProvisioner::new();
        let mut seq = Sequence::new();
        mock.expect_create_resource_group()
            .withf(|spec| spec.name == "rgRSMA-one")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|spec| Ok(group(&spec.name)));
        mock.expect_update_resource_group_tags()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|name, _| Ok(group(name)));
        mock.expect_create_resource_group()
            .withf(|spec| spec.name == "rgRSMA-two")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::ServiceUnavailable("quota".to_string())));
        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA-one"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_list_resource_groups().never();

        let report = orchestrator(mock).execute_with_session(session()).await;

        assert_eq!(report.failure.map(|f| f.step), Some(Step::CreateSecondary));
        assert_eq!(report.cleanup, CleanupOutcome::Submitted);
    }

    #[tokio::test]
    async fn list_failure_skips_secondary_delete() {
        let mut mock = MockProvisioner::new();
        mock.expect_create_resource_group()
            .times(2)
            .returning(|spec| Ok(group(&spec.name)));
        mock.expect_update_resource_group_tags()
            .times(1)
            .returning(|name, _| Ok(group(name)));
        mock.expect_list_resource_groups()
            .times(1)
            .returning(|| Err(Error::HttpError("page 2 failed".to_string())));
        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA-one"))
            .times(1)
            .returning(|_| Ok(()));

        let report = orchestrator(mock).execute_with_session(session()).await;

        assert_eq!(report.failure.map(|f| f.step), Some(Step::List));
        assert_eq!(report.cleanup, CleanupOutcome::Submitted);
    }

    #[tokio::test]
    async fn cleanup_failure_does_not_change_success() {
        let mut mock = MockProvisioner::new();
        mock.expect_create_resource_group()
            .times(2)
            .returning(|spec| Ok(group(&spec.name)));
        mock.expect_update_resource_group_tags()
            .returning(|name, _| Ok(group(name)));
        mock.expect_list_resource_groups()
            .returning(|| Ok(vec![group("rgRSMA-one"), group("rgRSMA-two")]));
        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA-two"))
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA-one"))
            .times(1)
            .returning(|_| Err(Error::ServiceUnavailable("throttled".to_string())));

        let report = orchestrator(mock).execute_with_session(session()).await;

        assert!(report.succeeded());
        assert!(matches!(report.cleanup, CleanupOutcome::Failed(Error::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn missing_client_skips_cleanup() {
        let orchestrator = LifecycleOrchestrator::without_client("local");

        let report = orchestrator.execute().await;

        assert!(!report.succeeded());
        assert!(report.failure.is_none());
        assert!(report.session.is_none());
        assert_eq!(report.cleanup, CleanupOutcome::Skipped);
        assert!(!orchestrator.run().await);
    }

    #[test]
    fn test_step_error_display() {
        let err = StepError {
            step: Step::TagPrimary,
            source: Error::NotFound("rg".to_string()),
        };
        assert_eq!(err.to_string(), "step `tag_primary` failed: Not found: rg");
    }
}

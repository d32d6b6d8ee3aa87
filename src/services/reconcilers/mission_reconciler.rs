//! Mission reconciler (C5, spec §4.5) — the phase state machine driving
//! attempts, completion checks, and retry/abort/timeout handling.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    parse_timeout, AttemptRecord, EventRecord, InvolvedObject, Mission, MissionPhase,
    MissionStatus, MissionTarget, ReviewOutcome, ReviewStatus,
};
use crate::domain::ports::{publish_json, ClusterGateway, MessageBus};
use crate::services::checks::CheckRunner;

const DEFAULT_WORKSPACE_BASE: &str = "/var/lib/kais/workspaces";

pub struct MissionReconciler {
    gateway: Arc<dyn ClusterGateway>,
    bus: Arc<dyn MessageBus>,
    workspace_base: String,
}

impl MissionReconciler {
    pub fn new(gateway: Arc<dyn ClusterGateway>, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            gateway,
            bus,
            workspace_base: DEFAULT_WORKSPACE_BASE.to_string(),
        }
    }

    pub fn with_workspace_base(mut self, base: impl Into<String>) -> Self {
        self.workspace_base = base.into();
        self
    }

    /// Runs one reconcile pass for `mission` (spec §4.5). Terminal phases
    /// are no-ops; `Pending` starts the mission; `Running` advances it one
    /// step (timeout check, then completion checks, then phase decision).
    pub async fn reconcile(&self, mission: &Mission) -> DomainResult<()> {
        let status = mission.status.clone().unwrap_or_default();
        if status.phase.is_terminal() {
            return Ok(());
        }

        match status.phase {
            MissionPhase::Pending => self.start(mission).await,
            MissionPhase::Running => self.advance(mission, status).await,
            MissionPhase::Succeeded | MissionPhase::Failed => Ok(()),
        }
    }

    async fn start(&self, mission: &Mission) -> DomainResult<()> {
        // Validates the exactly-one-ref invariant before the mission ever
        // leaves Pending (spec §3).
        mission.spec.target()?;

        self.publish_entrypoint(mission, &mission.spec.entrypoint.message).await?;

        let mut status = MissionStatus::default();
        status.phase = MissionPhase::Running;
        status.started_at = Some(Utc::now());
        status.attempt = 1;
        self.write_status(mission, status).await?;

        self.emit(mission, "MissionStarted", "mission entered Running").await;
        info!(mission = %mission.metadata.name, "mission started");
        Ok(())
    }

    async fn advance(&self, mission: &Mission, mut status: MissionStatus) -> DomainResult<()> {
        let timeout = parse_timeout(&mission.spec.completion.timeout)?;
        let started_at = status.started_at.unwrap_or_else(Utc::now);
        let elapsed = Utc::now().signed_duration_since(started_at);

        if elapsed.to_std().map(|e| e > timeout).unwrap_or(false) {
            return self.fail_attempt(mission, status, "Timeout").await;
        }

        let workspace_root = self.workspace_root(mission)?;
        let runner = CheckRunner::new(mission.metadata.namespace.clone(), workspace_root, self.bus.as_ref());
        let results = runner.run_all(&mission.spec.completion.checks).await;
        status.results = results;

        if !CheckRunner::all_passed(&status.results) {
            return self.fail_attempt(mission, status, "CompletionChecksFailed").await;
        }

        let review_enabled = mission
            .spec
            .completion
            .review
            .as_ref()
            .is_some_and(|r| r.enabled);
        if !review_enabled {
            return self.succeed(mission, status).await;
        }

        match status.review.clone() {
            None => {
                status.review = Some(ReviewOutcome {
                    status: ReviewStatus::Pending,
                    feedback: None,
                });
                self.write_status(mission, status).await
            }
            Some(ReviewOutcome { status: ReviewStatus::Approved, .. }) => {
                self.succeed(mission, status).await
            }
            Some(ReviewOutcome { status: ReviewStatus::Rejected, feedback }) => {
                self.fail_attempt(mission, status, feedback.as_deref().unwrap_or("ReviewRejected"))
                    .await
            }
            Some(ReviewOutcome { status: ReviewStatus::Pending, .. }) => {
                // Review pending beyond the mission's own timeout is already
                // handled above; otherwise this pass is a no-op wait.
                Ok(())
            }
        }
    }

    async fn succeed(&self, mission: &Mission, mut status: MissionStatus) -> DomainResult<()> {
        status.phase = MissionPhase::Succeeded;
        self.write_status(mission, status).await?;
        self.emit(mission, "MissionSucceeded", "all completion checks passed").await;
        info!(mission = %mission.metadata.name, "mission succeeded");
        Ok(())
    }

    /// Records the failed attempt, then either fails the mission permanently
    /// or re-sends the entrypoint message and continues (spec §4.5).
    async fn fail_attempt(&self, mission: &Mission, mut status: MissionStatus, reason: &str) -> DomainResult<()> {
        status.history.push(AttemptRecord {
            attempt: status.attempt,
            results: status.results.clone(),
            cost: status.cost,
            failure_reason: Some(reason.to_string()),
        });
        status.attempt += 1;

        let budget_exceeded = mission
            .spec
            .budget
            .as_ref()
            .and_then(|b| b.max_cost)
            .is_some_and(|max| status.cost >= max);

        if status.attempt > mission.spec.completion.max_attempts || budget_exceeded {
            status.phase = MissionPhase::Failed;
            status.message = Some(reason.to_string());
            self.write_status(mission, status).await?;
            self.emit(mission, "MissionFailed", reason).await;
            warn!(mission = %mission.metadata.name, reason, "mission failed");
            return Ok(());
        }

        self.write_status(mission, status).await?;
        let retry_message = format!("retry after failure: {reason}");
        self.publish_entrypoint(mission, &retry_message).await?;
        self.emit(mission, "MissionRetry", reason).await;
        Ok(())
    }

    /// Explicit retry (spec §6 "Exit semantics"): caller has already reset
    /// `phase` to `Pending`; this just re-validates the target reference.
    pub fn explicit_retry(mission: &mut Mission) {
        if let Some(status) = mission.status.as_mut() {
            status.phase = MissionPhase::Pending;
        }
    }

    /// Explicit abort (spec §6): sets `phase=Failed`, `message=UserAborted`.
    pub fn explicit_abort(mission: &mut Mission) {
        let mut status = mission.status.clone().unwrap_or_default();
        status.phase = MissionPhase::Failed;
        status.message = Some("UserAborted".to_string());
        mission.status = Some(status);
    }

    fn workspace_root(&self, mission: &Mission) -> DomainResult<String> {
        let target = match mission.spec.target()? {
            MissionTarget::Formation(f) => f.to_string(),
            MissionTarget::Cell(c) => c.to_string(),
        };
        Ok(format!("{}/{}/{}", self.workspace_base, mission.metadata.namespace, target))
    }

    async fn publish_entrypoint(&self, mission: &Mission, message: &str) -> DomainResult<()> {
        let subject = format!(
            "cell.{}.{}.inbox",
            mission.metadata.namespace, mission.spec.entrypoint.cell
        );
        publish_json(self.bus.as_ref(), &subject, &json!({ "message": message })).await
    }

    async fn write_status(&self, mission: &Mission, status: MissionStatus) -> DomainResult<()> {
        let mut updated = mission.clone();
        updated.status = Some(status);
        self.gateway.update_mission_status(&updated).await?;
        Ok(())
    }

    async fn emit(&self, mission: &Mission, reason: &str, message: &str) {
        self.gateway
            .emit_event(EventRecord::normal(
                reason,
                message,
                InvolvedObject {
                    kind: "Mission".into(),
                    namespace: mission.metadata.namespace.clone(),
                    name: mission.metadata.name.clone(),
                    uid: mission.metadata.uid.clone(),
                },
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryClusterGateway, InMemoryMessageBus};
    use crate::domain::models::{CheckSpec, CompletionSpec, EntrypointSpec, MissionSpec, ObjectMeta};

    fn sample_mission(checks: Vec<CheckSpec>, max_attempts: u32) -> Mission {
        Mission {
            metadata: ObjectMeta::new("ship-it", "default"),
            spec: MissionSpec {
                objective: "ship it".into(),
                formation_ref: None,
                cell_ref: Some("lead-0".into()),
                entrypoint: EntrypointSpec {
                    cell: "lead-0".into(),
                    message: "go".into(),
                },
                completion: CompletionSpec {
                    checks,
                    review: None,
                    max_attempts,
                    timeout: "30m".into(),
                },
                budget: None,
            },
            status: None,
        }
    }

    #[tokio::test]
    async fn pending_mission_starts_and_publishes_entrypoint() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let reconciler = MissionReconciler::new(gateway.clone(), bus.clone());
        let mission = sample_mission(vec![], 3);
        gateway.create_mission(&mission).await.unwrap();

        let mut subscription = bus.subscribe("cell.default.lead-0.inbox").await.unwrap();
        reconciler.reconcile(&mission).await.unwrap();

        use futures::StreamExt;
        let delivered = subscription.next().await;
        assert!(delivered.is_some());

        let updated = gateway.get_mission("default", "ship-it").await.unwrap();
        let status = updated.status.unwrap();
        assert_eq!(status.phase, MissionPhase::Running);
        assert_eq!(status.attempt, 1);
    }

    #[tokio::test]
    async fn all_checks_passing_without_review_succeeds() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let reconciler = MissionReconciler::new(gateway.clone(), bus.clone());
        let checks = vec![CheckSpec::Command {
            name: "pytest".into(),
            command: "echo passed".into(),
            success_pattern: Some("passed".into()),
            fail_pattern: None,
        }];
        let mission = sample_mission(checks, 3);
        gateway.create_mission(&mission).await.unwrap();

        reconciler.reconcile(&mission).await.unwrap();
        let running = gateway.get_mission("default", "ship-it").await.unwrap();
        reconciler.reconcile(&running).await.unwrap();

        let finished = gateway.get_mission("default", "ship-it").await.unwrap();
        assert_eq!(finished.status.unwrap().phase, MissionPhase::Succeeded);
    }

    #[tokio::test]
    async fn exhausting_attempts_fails_the_mission() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let reconciler = MissionReconciler::new(gateway.clone(), bus.clone());
        let checks = vec![CheckSpec::Command {
            name: "always-fails".into(),
            command: "exit 1".into(),
            success_pattern: None,
            fail_pattern: None,
        }];
        let mission = sample_mission(checks, 1);
        gateway.create_mission(&mission).await.unwrap();

        reconciler.reconcile(&mission).await.unwrap();
        let running = gateway.get_mission("default", "ship-it").await.unwrap();
        reconciler.reconcile(&running).await.unwrap();

        let finished = gateway.get_mission("default", "ship-it").await.unwrap();
        let status = finished.status.unwrap();
        assert_eq!(status.phase, MissionPhase::Failed);
        assert_eq!(status.history.len(), 1);
    }

    #[test]
    fn explicit_abort_sets_user_aborted_message() {
        let mut mission = sample_mission(vec![], 3);
        mission.status = Some(MissionStatus {
            phase: MissionPhase::Running,
            ..MissionStatus::default()
        });
        MissionReconciler::explicit_abort(&mut mission);
        let status = mission.status.unwrap();
        assert_eq!(status.phase, MissionPhase::Failed);
        assert_eq!(status.message.as_deref(), Some("UserAborted"));
    }
}

//! Check runner service (spec §4.6 "C6 Check runner").
//!
//! Builds concrete [`Check`] implementations from a Mission's
//! `completion.checks[]` and runs them all, collecting a [`CheckResult`] per
//! check. The runner itself never fails: a check that cannot complete
//! reports `CheckStatus::Error` rather than aborting the whole batch, so one
//! broken check never hides the results of its siblings.

use futures::future::join_all;

use crate::domain::models::{CheckResult, CheckSpec};
use crate::domain::ports::MessageBus;

use super::command::CommandCheck;
use super::coverage::CoverageCheck;
use super::file_exists::FileExistsCheck;
use super::nats_response::NatsResponseCheck;
use super::traits::{Check, CheckContext};

pub struct CheckRunner<'a> {
    namespace: String,
    workspace_root: String,
    bus: &'a dyn MessageBus,
}

impl<'a> CheckRunner<'a> {
    pub fn new(namespace: impl Into<String>, workspace_root: impl Into<String>, bus: &'a dyn MessageBus) -> Self {
        Self {
            namespace: namespace.into(),
            workspace_root: workspace_root.into(),
            bus,
        }
    }

    fn build(&self, spec: &CheckSpec) -> Box<dyn Check + 'a> {
        match spec {
            CheckSpec::FileExists { name, paths } => {
                Box::new(FileExistsCheck::new(name.clone(), self.workspace_root.clone(), paths.clone()))
            }
            CheckSpec::Command {
                name,
                command,
                success_pattern,
                fail_pattern,
            } => Box::new(CommandCheck::new(
                name.clone(),
                self.workspace_root.clone(),
                command.clone(),
                success_pattern.clone(),
                fail_pattern.clone(),
            )),
            CheckSpec::Coverage {
                name,
                command,
                json_path,
                operator,
                value,
            } => Box::new(CoverageCheck::new(
                name.clone(),
                self.workspace_root.clone(),
                command.clone(),
                json_path.clone(),
                *operator,
                *value,
            )),
            CheckSpec::NatsResponse {
                name,
                subject,
                success_pattern,
                fail_pattern,
                timeout_seconds,
            } => Box::new(NatsResponseCheck::new(
                name.clone(),
                subject.clone(),
                success_pattern.clone(),
                fail_pattern.clone(),
                *timeout_seconds,
            )),
        }
    }

    /// Runs every check concurrently and returns one [`CheckResult`] per
    /// input spec, in the same order.
    pub async fn run_all(&self, specs: &[CheckSpec]) -> Vec<CheckResult> {
        let ctx = CheckContext {
            namespace: &self.namespace,
            bus: self.bus,
        };
        let checks: Vec<_> = specs.iter().map(|spec| self.build(spec)).collect();
        join_all(checks.iter().map(|check| check.run(&ctx))).await
    }

    /// Whether every result in `results` passed (spec §4.5: a Mission
    /// completes once all of `completion.checks[]` pass).
    pub fn all_passed(results: &[CheckResult]) -> bool {
        results
            .iter()
            .all(|r| r.status == crate::domain::models::CheckStatus::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ComparisonOperator;

    #[tokio::test]
    async fn runs_mixed_check_kinds_and_preserves_order() {
        let bus = crate::adapters::memory::InMemoryMessageBus::new();
        let runner = CheckRunner::new("default", ".", &bus);
        let specs = vec![
            CheckSpec::Command {
                name: "one".into(),
                command: "exit 0".into(),
                success_pattern: None,
                fail_pattern: None,
            },
            CheckSpec::Command {
                name: "two".into(),
                command: "exit 1".into(),
                success_pattern: None,
                fail_pattern: None,
            },
        ];
        let results = runner.run_all(&specs).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "one");
        assert_eq!(results[1].name, "two");
        assert!(!CheckRunner::all_passed(&results));
        let _ = ComparisonOperator::Ge;
    }
}

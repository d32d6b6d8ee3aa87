//! `coverage` check (spec §4.6): runs a command expected to emit JSON,
//! extracts a numeric field by dotted path, and compares it against a
//! threshold with a [`ComparisonOperator`].

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command as TokioCommand;

use crate::domain::models::{CheckResult, CheckStatus, ComparisonOperator};

use super::traits::{Check, CheckContext};

pub struct CoverageCheck {
    name: String,
    workspace_root: String,
    command: String,
    json_path: String,
    operator: ComparisonOperator,
    value: f64,
}

impl CoverageCheck {
    pub fn new(
        name: impl Into<String>,
        workspace_root: impl Into<String>,
        command: impl Into<String>,
        json_path: impl Into<String>,
        operator: ComparisonOperator,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            workspace_root: workspace_root.into(),
            command: command.into(),
            json_path: json_path.into(),
            operator,
            value,
        }
    }

    /// Walks a dotted path (e.g. `"total.lines.pct"`) into a JSON value.
    fn extract(root: &Value, path: &str) -> Option<f64> {
        let mut current = root;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        current.as_f64()
    }
}

#[async_trait]
impl Check for CoverageCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &CheckContext<'_>) -> CheckResult {
        let output = TokioCommand::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.workspace_root)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return CheckResult {
                    name: self.name.clone(),
                    status: CheckStatus::Error,
                    output: Some(format!("failed to spawn command: {e}")),
                }
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: Value = match serde_json::from_str(stdout.trim()) {
            Ok(value) => value,
            Err(e) => {
                return CheckResult {
                    name: self.name.clone(),
                    status: CheckStatus::Error,
                    output: Some(format!("coverage output was not valid JSON: {e}")),
                }
            }
        };

        let Some(actual) = Self::extract(&parsed, &self.json_path) else {
            return CheckResult {
                name: self.name.clone(),
                status: CheckStatus::Error,
                output: Some(format!("json path {} not found in output", self.json_path)),
            };
        };

        let status = if self.operator.evaluate(actual, self.value) {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };

        CheckResult {
            name: self.name.clone(),
            status,
            output: Some(format!("{} = {actual}", self.json_path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(bus: &'a dyn crate::domain::ports::MessageBus) -> CheckContext<'a> {
        CheckContext { namespace: "default", bus }
    }

    #[test]
    fn extract_walks_nested_path() {
        let json: Value = serde_json::json!({"total": {"lines": {"pct": 91.5}}});
        assert_eq!(CoverageCheck::extract(&json, "total.lines.pct"), Some(91.5));
        assert_eq!(CoverageCheck::extract(&json, "total.branches.pct"), None);
    }

    #[tokio::test]
    async fn passes_when_threshold_met() {
        let bus = crate::adapters::memory::InMemoryMessageBus::new();
        let check = CoverageCheck::new(
            "cov",
            ".",
            r#"echo '{"total":{"lines":{"pct":95.0}}}'"#,
            "total.lines.pct",
            ComparisonOperator::Ge,
            90.0,
        );
        assert_eq!(check.run(&ctx(&bus)).await.status, CheckStatus::Passed);
    }

    #[tokio::test]
    async fn fails_when_threshold_missed() {
        let bus = crate::adapters::memory::InMemoryMessageBus::new();
        let check = CoverageCheck::new(
            "cov",
            ".",
            r#"echo '{"total":{"lines":{"pct":40.0}}}'"#,
            "total.lines.pct",
            ComparisonOperator::Ge,
            90.0,
        );
        assert_eq!(check.run(&ctx(&bus)).await.status, CheckStatus::Failed);
    }
}

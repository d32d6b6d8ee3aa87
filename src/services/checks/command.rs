//! `command` check (spec §4.6): runs a shell command in the mission's
//! workspace and inspects its exit status and output against optional
//! success/fail patterns.

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use crate::domain::models::{CheckResult, CheckStatus};

use super::traits::{Check, CheckContext};

pub struct CommandCheck {
    name: String,
    workspace_root: String,
    command: String,
    success_pattern: Option<String>,
    fail_pattern: Option<String>,
}

impl CommandCheck {
    pub fn new(
        name: impl Into<String>,
        workspace_root: impl Into<String>,
        command: impl Into<String>,
        success_pattern: Option<String>,
        fail_pattern: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            workspace_root: workspace_root.into(),
            command: command.into(),
            success_pattern,
            fail_pattern,
        }
    }
}

#[async_trait]
impl Check for CommandCheck {
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

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if let Some(pattern) = &self.fail_pattern {
            if combined.contains(pattern.as_str()) {
                return CheckResult {
                    name: self.name.clone(),
                    status: CheckStatus::Failed,
                    output: Some(combined),
                };
            }
        }

        let exit_ok = output.status.success();
        let pattern_ok = self
            .success_pattern
            .as_ref()
            .is_none_or(|pattern| combined.contains(pattern.as_str()));

        let status = if exit_ok && pattern_ok {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };

        CheckResult {
            name: self.name.clone(),
            status,
            output: Some(combined),
        }
    }
}

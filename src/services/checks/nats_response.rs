//! `natsResponse` check (spec §4.6): publishes a probe and waits for a
//! reply on `subject`, matching its payload against success/fail patterns.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::models::{CheckResult, CheckStatus};

use super::traits::{Check, CheckContext};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct NatsResponseCheck {
    name: String,
    subject: String,
    success_pattern: String,
    fail_pattern: Option<String>,
    timeout: Duration,
}

impl NatsResponseCheck {
    pub fn new(
        name: impl Into<String>,
        subject: impl Into<String>,
        success_pattern: impl Into<String>,
        fail_pattern: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            success_pattern: success_pattern.into(),
            fail_pattern,
            timeout: Duration::from_secs(timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

#[async_trait]
impl Check for NatsResponseCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let probe = serde_json::json!({ "check": self.name, "namespace": ctx.namespace });
        let reply = crate::domain::ports::request_json::<_, serde_json::Value>(
            ctx.bus,
            &self.subject,
            &probe,
            self.timeout,
        )
        .await;

        let body = match reply {
            Ok(value) => value.to_string(),
            Err(e) => {
                return CheckResult {
                    name: self.name.clone(),
                    status: CheckStatus::Error,
                    output: Some(format!("no reply on {}: {e}", self.subject)),
                }
            }
        };

        if let Some(pattern) = &self.fail_pattern {
            if body.contains(pattern.as_str()) {
                return CheckResult {
                    name: self.name.clone(),
                    status: CheckStatus::Failed,
                    output: Some(body),
                };
            }
        }

        let status = if body.contains(&self.success_pattern) {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };

        CheckResult {
            name: self.name.clone(),
            status,
            output: Some(body),
        }
    }
}

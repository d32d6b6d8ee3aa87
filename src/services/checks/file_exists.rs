//! `fileExists` check (spec §4.6): passes when every listed path exists
//! relative to the mission's workspace.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::models::{CheckResult, CheckStatus};

use super::traits::{Check, CheckContext};

pub struct FileExistsCheck {
    name: String,
    workspace_root: String,
    paths: Vec<String>,
}

impl FileExistsCheck {
    pub fn new(name: impl Into<String>, workspace_root: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            workspace_root: workspace_root.into(),
            paths,
        }
    }
}

#[async_trait]
impl Check for FileExistsCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &CheckContext<'_>) -> CheckResult {
        let mut missing = Vec::new();
        for rel in &self.paths {
            let full = Path::new(&self.workspace_root).join(rel);
            if !full.exists() {
                missing.push(rel.clone());
            }
        }

        if missing.is_empty() {
            CheckResult {
                name: self.name.clone(),
                status: CheckStatus::Passed,
                output: None,
            }
        } else {
            CheckResult {
                name: self.name.clone(),
                status: CheckStatus::Failed,
                output: Some(format!("missing paths: {}", missing.join(", "))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ctx<'a>(bus: &'a dyn crate::domain::ports::MessageBus) -> CheckContext<'a> {
        CheckContext { namespace: "default", bus }
    }

    #[tokio::test]
    async fn passes_when_all_paths_exist() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("out.txt"), "ok").unwrap();
        let bus = crate::adapters::memory::InMemoryMessageBus::new();
        let check = FileExistsCheck::new("has-output", dir.path().to_str().unwrap(), vec!["out.txt".into()]);
        let result = check.run(&ctx(&bus)).await;
        assert_eq!(result.status, CheckStatus::Passed);
    }

    #[tokio::test]
    async fn fails_when_a_path_is_missing() {
        let dir = tempdir().unwrap();
        let bus = crate::adapters::memory::InMemoryMessageBus::new();
        let check = FileExistsCheck::new("has-output", dir.path().to_str().unwrap(), vec!["missing.txt".into()]);
        let result = check.run(&ctx(&bus)).await;
        assert_eq!(result.status, CheckStatus::Failed);
    }
}

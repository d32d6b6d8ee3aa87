//! Completion check specifications (spec §3 "Mission", §4.6 "Check runner").

use serde::{Deserialize, Serialize};

/// One of the four check kinds a Mission's `completion.checks[]` can name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CheckSpec {
    FileExists {
        name: String,
        paths: Vec<String>,
    },
    Command {
        name: String,
        command: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        success_pattern: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fail_pattern: Option<String>,
    },
    Coverage {
        name: String,
        command: String,
        json_path: String,
        operator: ComparisonOperator,
        value: f64,
    },
    NatsResponse {
        name: String,
        subject: String,
        success_pattern: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        fail_pattern: Option<String>,
        #[serde(default)]
        timeout_seconds: Option<u64>,
    },
}

impl CheckSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::FileExists { name, .. }
            | Self::Command { name, .. }
            | Self::Coverage { name, .. }
            | Self::NatsResponse { name, .. } => name,
        }
    }
}

/// Comparison operator for the `coverage` check (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ComparisonOperator {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            ">=" => Some(Self::Ge),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            "<" => Some(Self::Lt),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }

    pub fn evaluate(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Ge => lhs >= rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Lt => lhs < rhs,
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
            Self::Ne => (lhs - rhs).abs() >= f64::EPSILON,
        }
    }
}

/// Outcome of one check execution (spec §4.6: "never throws").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CheckStatus {
    Pending,
    Passed,
    Failed,
    Error,
}

impl CheckStatus {
    pub const fn is_terminal_pass(self) -> bool {
        matches!(self, Self::Passed)
    }

    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_parses_all_tokens() {
        for tok in [">=", ">", "<=", "<", "==", "!="] {
            assert!(ComparisonOperator::parse(tok).is_some());
        }
        assert!(ComparisonOperator::parse("~=").is_none());
    }

    #[test]
    fn operator_evaluates_correctly() {
        assert!(ComparisonOperator::Ge.evaluate(0.9, 0.8));
        assert!(!ComparisonOperator::Gt.evaluate(0.8, 0.8));
        assert!(ComparisonOperator::Eq.evaluate(1.0, 1.0));
    }
}

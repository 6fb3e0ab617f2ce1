// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic context attached to fatal task failures.

use serde::{Deserialize, Serialize};

/// A small structured snapshot of where a fatal failure happened, so operators reading task
/// status don't have to grep logs for a `task_id` to find the failing component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Which component raised the failure, e.g. `"vcs"`, `"upstream"`, `"runner"`.
    pub component: String,
    /// Lifecycle step in progress when the failure happened, e.g. `"clone"`, `"stream"`, `"push"`.
    pub step: String,
    pub message: String,
}

impl Breadcrumb {
    pub fn new(component: impl Into<String>, step: impl Into<String>, message: impl Into<String>) -> Self {
        Self { component: component.into(), step: step.into(), message: message.into() }
    }
}

impl std::fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.component, self.step, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_component_step_message() {
        let b = Breadcrumb::new("vcs", "push", "authentication failed");
        assert_eq!(b.to_string(), "[vcs:push] authentication failed");
    }
}

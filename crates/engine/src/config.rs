// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Engine configuration. Per the ambient-stack convention, reads are centralized with
//! documented defaults rather than threaded through a config-file parser — there is no config
//! file, only environment variables (the binary that owns `main` is responsible for calling
//! [`EngineConfig::from_env`] once at startup).

use std::time::Duration;

use agent8_process::RunnerIdentity;

const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "rs", "toml", "ts", "tsx", "js", "jsx", "json", "md", "yml", "yaml", "py", "go", "java", "rb",
    "css", "html", "sh", "txt", "lock",
];
const DEFAULT_EXCLUDED_DIRS: &[&str] =
    &[".git", "node_modules", "target", "dist", "build", ".agent8"];
const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &["**/*.min.js", "**/*.lock.bak"];

const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
const DEFAULT_MAX_TOTAL_BYTES: u64 = 50 * 1024 * 1024;
const DEFAULT_GITLAB_BRANCH: &str = "develop";
const DEFAULT_ISSUE_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_UPSTREAM_INACTIVITY_BUDGET: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub allowed_extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
    pub excluded_patterns: Vec<String>,
    pub max_file_bytes: u64,
    pub max_total_bytes: u64,

    pub gitlab_url: String,
    pub gitlab_token: String,
    pub gitlab_branch: String,

    pub issue_poll_interval: Duration,
    pub upstream_inactivity_budget: Duration,

    pub runner_identity: Option<RunnerIdentity>,
    pub container_id: String,
}

impl EngineConfig {
    /// Build from environment variables per SPEC_FULL.md §6/§6.1, falling back to documented
    /// defaults. `gitlab_url`/`gitlab_token` are required for the Task Engine to function but are
    /// left empty here rather than failing construction — a task that needs them surfaces the
    /// failure at the VCS checkout step, not at process startup.
    pub fn from_env() -> Self {
        Self {
            allowed_extensions: env_list("AGENT8_ALLOWED_EXTENSIONS", DEFAULT_ALLOWED_EXTENSIONS),
            excluded_dirs: env_list("AGENT8_EXCLUDED_DIRS", DEFAULT_EXCLUDED_DIRS),
            excluded_patterns: env_list("AGENT8_EXCLUDED_PATTERNS", DEFAULT_EXCLUDED_PATTERNS),
            max_file_bytes: env_u64("AGENT8_MAX_FILE_BYTES", DEFAULT_MAX_FILE_BYTES),
            max_total_bytes: env_u64("AGENT8_MAX_TOTAL_BYTES", DEFAULT_MAX_TOTAL_BYTES),

            gitlab_url: std::env::var("GITLAB_URL").unwrap_or_default(),
            gitlab_token: std::env::var("GITLAB_TOKEN").unwrap_or_default(),
            gitlab_branch: std::env::var("GITLAB_BRANCH")
                .unwrap_or_else(|_| DEFAULT_GITLAB_BRANCH.to_string()),

            issue_poll_interval: DEFAULT_ISSUE_POLL_INTERVAL,
            upstream_inactivity_budget: DEFAULT_UPSTREAM_INACTIVITY_BUDGET,

            runner_identity: runner_identity_from_env(),
            container_id: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
        }
    }
}

fn env_list(var: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(var) {
        Ok(value) => value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// `AGENT8_RUNNER_UID`/`AGENT8_RUNNER_GID`, both required to produce an identity; absent when
/// unset, matching "no drop when not running as root" (the binary decides whether to default to
/// a built-in `nobody`-equivalent pair when it detects it is running as root).
fn runner_identity_from_env() -> Option<RunnerIdentity> {
    let uid = std::env::var("AGENT8_RUNNER_UID").ok()?.parse().ok()?;
    let gid = std::env::var("AGENT8_RUNNER_GID").ok()?.parse().ok()?;
    Some(RunnerIdentity { uid, gid })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_list_falls_back_to_default_when_unset() {
        let parsed = env_list("AGENT8_ENGINE_CONFIG_TEST_UNSET_VAR", &["a", "b"]);
        assert_eq!(parsed, vec!["a".to_string(), "b".to_string()]);
    }

}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation families a client may send to the Session Gateway.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Encoding for `readFile`/`writeFile` content. Mirrors Node's `fs` encoding names since clients
/// in this ecosystem are written against that convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Utf8,
    Base64,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

/// A recursive description of a directory tree to materialize via `mount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MountNode {
    File { contents: String },
    Directory { tree: HashMap<String, MountNode> },
}

/// Everything a `readdir` response needs to describe one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

/// The single request payload a client sends, tagged on `type`.
///
/// This is the whole surface of the Session Gateway: everything routes through one of these
/// variants, dispatched by family (filesystem / process / watch / auth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    #[serde(rename = "readFile")]
    ReadFile {
        path: String,
        #[serde(default)]
        encoding: Encoding,
    },
    #[serde(rename = "writeFile")]
    WriteFile {
        path: String,
        content: String,
        #[serde(default)]
        encoding: Encoding,
    },
    Rm {
        path: String,
        #[serde(default)]
        recursive: bool,
        #[serde(default)]
        force: bool,
    },
    Readdir {
        path: String,
        #[serde(default)]
        with_file_types: bool,
    },
    Mkdir {
        path: String,
        #[serde(default)]
        recursive: bool,
    },
    Stat {
        path: String,
    },
    Mount {
        path: String,
        tree: HashMap<String, MountNode>,
    },

    Spawn {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Input {
        pid: u32,
        data: String,
    },
    Kill {
        pid: u32,
    },
    Resize {
        pid: u32,
        cols: u16,
        rows: u16,
    },

    Watch {
        patterns: Vec<String>,
        #[serde(default)]
        persistent: bool,
    },
    #[serde(rename = "watch-paths")]
    WatchPaths {
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
        #[serde(default)]
        include_content: bool,
    },
    Stop {
        watcher_id: String,
    },

    Auth {
        token: String,
    },
}

impl Operation {
    /// Short family name, used for log spans and metrics labels.
    pub fn family(&self) -> &'static str {
        match self {
            Operation::ReadFile { .. }
            | Operation::WriteFile { .. }
            | Operation::Rm { .. }
            | Operation::Readdir { .. }
            | Operation::Mkdir { .. }
            | Operation::Stat { .. }
            | Operation::Mount { .. } => "fs",
            Operation::Spawn { .. }
            | Operation::Input { .. }
            | Operation::Kill { .. }
            | Operation::Resize { .. } => "process",
            Operation::Watch { .. } | Operation::WatchPaths { .. } | Operation::Stop { .. } => {
                "watch"
            }
            Operation::Auth { .. } => "auth",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_file_deserializes_with_default_encoding() {
        let op: Operation = serde_json::from_str(r#"{"type":"readFile","path":"a.txt"}"#).unwrap();
        assert_eq!(op, Operation::ReadFile { path: "a.txt".into(), encoding: Encoding::Utf8 });
    }

    #[test]
    fn watch_paths_uses_kebab_case_tag() {
        let op: Operation =
            serde_json::from_str(r#"{"type":"watch-paths","include":["**/*.ts"]}"#).unwrap();
        assert_eq!(op.family(), "watch");
    }

    #[test]
    fn spawn_is_process_family() {
        let op =
            Operation::Spawn { command: "/bin/sh".into(), args: vec!["-c".into(), "echo hi".into()] };
        assert_eq!(op.family(), "process");
    }

    #[test]
    fn mount_tree_round_trips() {
        let mut tree = HashMap::new();
        tree.insert("a.txt".to_string(), MountNode::File { contents: "hi".into() });
        let op = Operation::Mount { path: ".".into(), tree };
        let json = serde_json::to_string(&op).unwrap();
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}

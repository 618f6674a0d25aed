#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub fn assistant_line(
    ts: DateTime<Utc>,
    model: &str,
    message_id: &str,
    request_id: &str,
    input: u64,
    output: u64,
) -> String {
    serde_json::json!({
        "type": "assistant",
        "timestamp": ts.to_rfc3339(),
        "requestId": request_id,
        "message": {
            "id": message_id,
            "model": model,
            "usage": {
                "input_tokens": input,
                "output_tokens": output,
                "cache_creation_input_tokens": 0,
                "cache_read_input_tokens": 0
            }
        }
    })
    .to_string()
}

/// Write `<root>/<project>/<session>.jsonl`, or under `subagents/` when asked.
pub fn write_log(root: &Path, project: &str, session: &str, subagent: bool, lines: &[String]) -> PathBuf {
    let mut dir = root.join(project);
    if subagent {
        dir = dir.join("subagents");
    }
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{session}.jsonl"));
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

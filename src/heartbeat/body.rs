//! Heartbeat request construction.
//!
//! Two WakaTime-flavored JSON schemas exist in the wild for this reporter.
//! The rich one (hackatime-style) carries `is_write`, `editor` and an
//! aggregate `lines` figure; the legacy one splits line counts into
//! `line_additions`/`line_deletions` and identifies the host through
//! `user_agent`/`machine_name_id`. Both are supported; the schema is picked
//! in config.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::activity::ActivitySnapshot;
use crate::config::{Config, DEFAULT_ENDPOINT};

/// Fixed path appended to the configured endpoint.
pub const HEARTBEAT_PATH: &str = "/users/current/heartbeats";

/// Plugin identifier sent in the body and the User-Agent header.
const PLUGIN_NAME: &str = "wakabeat";

/// Editor identifier for the rich schema.
const EDITOR_NAME: &str = "Unreal Engine";

/// Which JSON field set to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatSchema {
    #[default]
    Rich,
    Legacy,
}

/// One fully-formed outbound heartbeat: target URL, auth, and JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatRequest {
    pub url: String,
    pub bearer_token: String,
    pub user_agent: String,
    pub body: Value,
}

/// Resolve the full heartbeat URL from a configured endpoint.
///
/// Empty endpoints fall back to [`DEFAULT_ENDPOINT`]; a single trailing
/// slash is stripped before the fixed path is appended.
pub fn heartbeat_url(endpoint: &str) -> String {
    let base = if endpoint.is_empty() {
        DEFAULT_ENDPOINT
    } else {
        endpoint
    };
    let base = base.strip_suffix('/').unwrap_or(base);
    format!("{}{}", base, HEARTBEAT_PATH)
}

impl HeartbeatRequest {
    /// Build one heartbeat from a snapshot and the configured settings.
    pub fn build(snapshot: &ActivitySnapshot, config: &Config, time: i64) -> Self {
        let machine = config.machine_name();
        let os = config.os_name();
        let version = env!("CARGO_PKG_VERSION");

        let body = match config.schema {
            HeartbeatSchema::Rich => json!({
                "type": "file",
                "time": time,
                "project": config.project,
                "entity": snapshot.last_saved_entity,
                "language": config.language,
                "is_write": snapshot.is_write(),
                "editor": EDITOR_NAME,
                "plugin": PLUGIN_NAME,
                "operating_system": os,
                "machine": machine,
                "lines": snapshot.lines(),
                "lineno": 1,
                "cursorpos": 0,
            }),
            HeartbeatSchema::Legacy => json!({
                "type": "file",
                "time": time,
                "project": config.project,
                "entity": snapshot.last_saved_entity,
                "language": config.language,
                "plugin": PLUGIN_NAME,
                "is_write": false,
                "user_agent": format!("{}/{}", PLUGIN_NAME, version),
                "machine_name_id": machine,
                "line_additions": snapshot.add_count,
                "line_deletions": snapshot.delete_count,
                "operating_system": os,
            }),
        };

        Self {
            url: heartbeat_url(&config.endpoint),
            bearer_token: config.trimmed_token().to_string(),
            user_agent: format!("{}/{}", PLUGIN_NAME, version),
            body,
        }
    }
}

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use ibot::config::{ApiConfig, ChatConfig};

/// API configuration pointing at a mock server, with polling tightened so
/// tests do not sleep between iterations.
#[allow(dead_code)]
pub fn api_config(uri: &str) -> ApiConfig {
    ApiConfig {
        base_url: uri.to_string(),
        poll_interval_seconds: 0,
        poll_deadline_seconds: 5,
        ..ApiConfig::default()
    }
}

/// Chat configuration with pacing fast enough for tests.
#[allow(dead_code)]
pub fn chat_config() -> ChatConfig {
    ChatConfig {
        pacing_interval_ms: 1,
        stream_idle_timeout_seconds: 5,
        ..ChatConfig::default()
    }
}

/// A `{code: 200, msg, data}` success envelope around the given payload.
#[allow(dead_code)]
pub fn success_envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "code": 200, "msg": "success", "data": data })
}

/// An error envelope with the given application code and message.
#[allow(dead_code)]
pub fn error_envelope(code: i64, msg: &str) -> serde_json::Value {
    serde_json::json!({ "code": code, "msg": msg })
}

#[allow(dead_code)]
pub fn sse_token(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "type": "token", "content": content })
    )
}

#[allow(dead_code)]
pub fn sse_sources(documents: serde_json::Value) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "type": "sources", "documents": documents })
    )
}

#[allow(dead_code)]
pub fn sse_done(thinking_time: f64) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "type": "done", "thinking_time": thinking_time })
    )
}

#[allow(dead_code)]
pub fn sse_error(error: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "type": "error", "error": error })
    )
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

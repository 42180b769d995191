//! Shapes of the JSON replies returned by Voice's action endpoints.
//!
//! Action endpoints (call, sms, star, ...) answer with a small object:
//! ```json
//! {"ok": true, "data": {...}}
//! {"ok": false, "data": {"code": 20}}
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::{GvError, Result};

/// Reply from an action endpoint.
#[derive(Debug, Deserialize)]
pub struct ActionReply {
    /// Success flag (absent counts as failure)
    #[serde(default)]
    pub ok: bool,
    /// Payload, or error details when `ok` is false
    #[serde(default)]
    pub data: Option<Value>,
    /// Some endpoints put a message here instead of in `data`
    #[serde(default)]
    pub error: Option<Value>,
}

impl ActionReply {
    pub fn parse(page: &str, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| GvError::parse(page, format!("invalid JSON reply: {}", e)))
    }
}

/// Check that an action reply is A-OK.
pub fn validate(page: &str, body: &str) -> Result<ActionReply> {
    let reply = ActionReply::parse(page, body)?;
    if reply.ok {
        return Ok(reply);
    }

    let detail = reply
        .error
        .as_ref()
        .or(reply.data.as_ref())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "no details".to_string());
    Err(GvError::Rejected(format!("{}: {}", page, detail)))
}

//! Call commands: call, cancel.

use crate::output::OutputControls;
use anyhow::{bail, Context, Result};
use gvoice_core::{PhoneType, Voice};
use serde_json::json;

/// Parse a phone type given as its number (`2`) or name (`mobile`).
pub fn parse_phone_type(value: &str) -> Result<PhoneType> {
    let kind = match value.trim().to_lowercase().as_str() {
        "home" => PhoneType::Home,
        "mobile" | "cell" => PhoneType::Mobile,
        "work" => PhoneType::Work,
        "gizmo" => PhoneType::Gizmo,
        other => match other.parse::<u8>() {
            Ok(n) => PhoneType::from(n),
            Err(_) => bail!("unknown phone type '{}' (use 1-Home, 2-Mobile, 3-Work, 7-Gizmo)", value),
        },
    };
    Ok(kind)
}

/// Ring the forwarding phone and connect it to `outgoing`.
pub fn call(
    voice: &mut Voice,
    outgoing: &str,
    forwarding: Option<&str>,
    phone_type: Option<PhoneType>,
    subscriber: Option<&str>,
    output: &OutputControls,
) -> Result<()> {
    voice
        .call(outgoing, forwarding, phone_type, subscriber)
        .with_context(|| format!("failed to call {}", outgoing))?;

    if output.json {
        output.print(&json!({
            "success": true,
            "outgoing": outgoing,
            "forwarding": forwarding,
        }));
    } else {
        println!("Calling {}...", outgoing);
    }
    Ok(())
}

/// Cancel a call that is still ringing.
pub fn cancel(
    voice: &mut Voice,
    outgoing: Option<&str>,
    forwarding: Option<&str>,
    output: &OutputControls,
) -> Result<()> {
    voice
        .cancel(outgoing, forwarding)
        .context("failed to cancel call")?;

    if output.json {
        output.print(&json!({"success": true}));
    } else {
        println!("Call cancelled");
    }
    Ok(())
}

//! Messaging commands: send-sms.

use crate::output::OutputControls;
use anyhow::{bail, Context, Result};
use gvoice_core::Voice;
use serde_json::json;

/// Send an SMS from the account's Google Voice number.
pub fn send_sms(voice: &mut Voice, phone: &str, message: &str, output: &OutputControls) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Please provide a message");
    }

    voice
        .send_sms(phone, message)
        .with_context(|| format!("failed to send SMS to {}", phone))?;

    if output.json {
        output.print(&json!({
            "success": true,
            "phone": phone,
            "message": message
        }));
    } else {
        println!("Message sent to {}", phone);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvoice_core::Config;

    #[test]
    fn test_empty_message_is_refused_before_sending() {
        let mut voice = Voice::new(&Config::default()).unwrap();
        let err = send_sms(&mut voice, "+14155551234", "  ", &OutputControls::default()).unwrap_err();
        assert_eq!(err.to_string(), "Please provide a message");
    }
}

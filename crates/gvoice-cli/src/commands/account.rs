//! Account commands: login, phones, settings, enable-phone, disable-phone.

use crate::output::OutputControls;
use anyhow::{Context, Result};
use gvoice_core::{Phone, Voice};
use serde_json::json;

/// Report the signed-in account (login itself already happened in `main`).
pub fn status(voice: &Voice, output: &OutputControls) -> Result<()> {
    let email = voice.session().email().unwrap_or_default();
    if output.json {
        output.print(&json!({
            "success": true,
            "email": email,
            "state": format!("{:?}", voice.state()),
        }));
    } else {
        println!("Logged in as {}", email);
    }
    Ok(())
}

/// List forwarding phones.
pub fn phones(voice: &mut Voice, output: &OutputControls) -> Result<()> {
    let phones = voice.phones().context("failed to load phones")?;

    if output.json {
        output.print(&phones);
        return Ok(());
    }

    if phones.is_empty() {
        println!("No forwarding phones.");
        return Ok(());
    }
    println!("Phones ({}):", phones.len());
    println!("{}", "-".repeat(50));
    for phone in &phones {
        println!("{}", phone_line(phone));
    }
    Ok(())
}

fn phone_line(phone: &Phone) -> String {
    let number = if phone.formatted_number.is_empty() {
        &phone.phone_number
    } else {
        &phone.formatted_number
    };
    let mut line = format!("{}: {} {} ({})", phone.id, phone.name, number, phone.phone_type);
    if phone.sms_enabled {
        line.push_str(" [sms]");
    }
    if !phone.verified {
        line.push_str(" [unverified]");
    }
    line
}

/// Show account settings.
pub fn settings(voice: &mut Voice, output: &OutputControls) -> Result<()> {
    let settings = voice.settings().context("failed to load settings")?;

    if output.json {
        output.print(&settings);
        return Ok(());
    }

    if let Some(did) = settings.primary_did() {
        println!("Google Voice number: {}", did);
    }
    for (key, value) in &settings.0 {
        let shown = match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        };
        println!("{}: {}", key, output.clip(&shown));
    }
    Ok(())
}

/// Turn forwarding to a phone on or off.
pub fn set_forwarding(voice: &mut Voice, phone_id: &str, enabled: bool, output: &OutputControls) -> Result<()> {
    let result = if enabled {
        voice.enable_phone(phone_id)
    } else {
        voice.disable_phone(phone_id)
    };
    result.with_context(|| format!("failed to update phone {}", phone_id))?;

    if output.json {
        output.print(&json!({
            "success": true,
            "phone_id": phone_id,
            "enabled": enabled,
        }));
    } else {
        let state = if enabled { "enabled" } else { "disabled" };
        println!("Forwarding to phone {} {}", phone_id, state);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvoice_core::PhoneType;

    #[test]
    fn test_phone_line() {
        let phone = Phone {
            id: "3".into(),
            phone_number: "+14155552222".into(),
            formatted_number: "(415) 555-2222".into(),
            name: "Cell".into(),
            phone_type: PhoneType::Mobile,
            verified: true,
            sms_enabled: true,
            active: true,
        };
        assert_eq!(phone_line(&phone), "3: Cell (415) 555-2222 (mobile) [sms]");
    }
}

//! Folder views: inbox, voicemail, sms, ... and search.

use crate::output::OutputControls;
use anyhow::{Context, Result};
use chrono::Local;
use gvoice_core::{Feed, Folder, Message, Voice};

/// Timestamp format for listings, in local time.
const LIST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Show one feed.
pub fn folder(voice: &mut Voice, feed: Feed, output: &OutputControls) -> Result<()> {
    let folder = voice
        .folder(feed)
        .with_context(|| format!("failed to fetch {}", feed))?;
    show(&folder, output);
    Ok(())
}

/// Search call, voicemail and SMS history.
pub fn search(voice: &mut Voice, query: &str, output: &OutputControls) -> Result<()> {
    let folder = voice
        .search(query)
        .with_context(|| format!("search for '{}' failed", query))?;
    show(&folder, output);
    Ok(())
}

pub fn show(folder: &Folder, output: &OutputControls) {
    if output.json {
        output.print(folder);
        return;
    }

    println!("{}", folder);
    if folder.messages.is_empty() {
        println!("  (no messages)");
        return;
    }
    for message in &folder.messages {
        println!("  {}", message_line(message, output));
    }
}

/// One listing line: id, local time, sender, flags, then any text.
fn message_line(message: &Message, output: &OutputControls) -> String {
    let when = message
        .start_time
        .with_timezone(&Local)
        .format(LIST_TIME_FORMAT);

    let mut flags = Vec::new();
    if !message.is_read {
        flags.push("unread");
    }
    if message.starred {
        flags.push("starred");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    let mut line = format!("{}  {}  {}{}", message.id, when, message.sender(), flags);
    if let Some(secs) = message.duration_secs {
        line.push_str(&format!("  {}:{:02}", secs / 60, secs % 60));
    }
    if let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) {
        line.push_str("  ");
        line.push_str(&output.clip(text));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message() -> Message {
        Message {
            id: "6f0fbd0d".into(),
            phone_number: "+14155551234".into(),
            display_number: "(415) 555-1234".into(),
            start_time: Utc.timestamp_millis_opt(1_262_304_000_000).unwrap(),
            display_start_date_time: None,
            relative_start_time: None,
            note: String::new(),
            children: String::new(),
            text: Some("see you at eight tonight".into()),
            is_read: false,
            is_spam: false,
            is_trash: false,
            starred: true,
            labels: vec!["sms".into()],
            kind: Some(10),
            duration_secs: None,
        }
    }

    #[test]
    fn test_message_line() {
        let output = OutputControls {
            max_text_chars: Some(10),
            ..Default::default()
        };
        let line = message_line(&message(), &output);

        assert!(line.starts_with("6f0fbd0d  "));
        assert!(line.contains("(415) 555-1234 [unread, starred]"));
        assert!(line.ends_with("  see you at..."));
    }

    #[test]
    fn test_message_line_with_duration() {
        let mut voicemail = message();
        voicemail.text = None;
        voicemail.is_read = true;
        voicemail.starred = false;
        voicemail.duration_secs = Some(75);

        let line = message_line(&voicemail, &OutputControls::default());
        assert!(line.ends_with("(415) 555-1234  1:15"));
    }
}

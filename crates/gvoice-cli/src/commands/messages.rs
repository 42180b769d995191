//! Per-message commands: archive, delete, star, mark, download.

use std::path::{Path, PathBuf};

use crate::output::OutputControls;
use anyhow::{Context, Result};
use gvoice_core::Voice;
use serde_json::json;

/// Which message flag to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Archive,
    Trash,
    Star,
    Read,
}

impl Action {
    /// Past-tense description for the confirmation line.
    fn describe(self, on: bool) -> &'static str {
        match (self, on) {
            (Action::Archive, true) => "archived",
            (Action::Archive, false) => "moved back to the inbox",
            (Action::Trash, true) => "moved to trash",
            (Action::Trash, false) => "restored from trash",
            (Action::Star, true) => "starred",
            (Action::Star, false) => "unstarred",
            (Action::Read, true) => "marked read",
            (Action::Read, false) => "marked unread",
        }
    }
}

/// Set or clear one flag on a message.
pub fn update(voice: &mut Voice, action: Action, id: &str, on: bool, output: &OutputControls) -> Result<()> {
    let result = match action {
        Action::Archive => voice.archive(id, on),
        Action::Trash => voice.delete(id, on),
        Action::Star => voice.star(id, on),
        Action::Read => voice.mark(id, on),
    };
    result.with_context(|| format!("failed to update message {}", id))?;

    if output.json {
        output.print(&json!({
            "success": true,
            "id": id,
            "action": action.describe(on),
        }));
    } else {
        println!("Message {} {}", id, action.describe(on));
    }
    Ok(())
}

/// Expand `~` in a user-given directory.
pub fn expand_dir(dir: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(dir).to_string())
}

/// Save a voicemail or recording as `<dir>/<id>.mp3`.
pub fn download(voice: &mut Voice, id: &str, dir: &Path, output: &OutputControls) -> Result<()> {
    let path = voice
        .download(id, dir)
        .with_context(|| format!("failed to download {}", id))?;

    if output.json {
        output.print(&json!({
            "success": true,
            "id": id,
            "path": path.display().to_string(),
        }));
    } else {
        println!("MP3 downloaded to {}", path.display());
    }
    Ok(())
}

//! Resource accessors: calls, SMS, folders, message actions, downloads,
//! contacts and forwarding phones.
//!
//! Every accessor goes through [`Session::request`], so all of them fail with
//! `AuthError::NotLoggedIn` before any network traffic when the session is
//! not signed in.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{CallConfig, Config};
use crate::endpoints::{Endpoint, Endpoints, Feed};
use crate::error::{AuthError, GvError, Result};
use crate::feed::{parse_feed, FeedDocument};
use crate::protocol::{self, ActionReply};
use crate::records::{AccountSettings, ContactsFeed, Folder, Phone, PhoneType};
use crate::session::{Credentials, Params, Session, SessionState};
use crate::verify::CodeSource;

/// Placeholder the web app sends for "not specified".
const UNDEFINED: &str = "undefined";

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Message ids are SHA1 hex strings; anything else is refused before it
/// reaches a URL or a file name.
fn check_message_id(id: &str) -> Result<()> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(GvError::Download {
            id: id.to_string(),
            reason: "not a valid message id".into(),
        })
    }
}

/// The Google Voice client.
pub struct Voice {
    session: Session,
    defaults: CallConfig,
    contacts: Option<ContactsFeed>,
}

impl Voice {
    /// Build an unauthenticated client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::from_session(Session::new(&config.service)?, config.gvoice.clone()))
    }

    pub fn from_session(session: Session, defaults: CallConfig) -> Self {
        Self {
            session,
            defaults,
            contacts: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn endpoints(&self) -> &Endpoints {
        self.session.endpoints()
    }

    pub fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.session.login(credentials)
    }

    pub fn login_with(&mut self, credentials: &Credentials, codes: &mut dyn CodeSource) -> Result<()> {
        self.session.login_with(credentials, codes)
    }

    pub fn logout(&mut self) {
        self.contacts = None;
        self.session.logout();
    }

    // ========================================================================
    // Calls and SMS
    // ========================================================================

    /// Ring `forwarding` (or the configured forwarding number) and connect it
    /// to `outgoing`.
    pub fn call(
        &mut self,
        outgoing: &str,
        forwarding: Option<&str>,
        phone_type: Option<PhoneType>,
        subscriber: Option<&str>,
    ) -> Result<()> {
        let forwarding = forwarding
            .map(str::to_string)
            .or_else(|| self.defaults.forwarding_number.clone());
        let phone_type = phone_type.or_else(|| self.defaults.phone_type.map(PhoneType::from));

        let mut params = Params::new()
            .form("outgoingNumber", outgoing)
            .form("subscriberNumber", subscriber.unwrap_or(UNDEFINED))
            .form("remember", "1");
        if let Some(number) = forwarding {
            params = params.form("forwardingNumber", number);
        }
        if let Some(kind) = phone_type {
            params = params.form("phoneType", u8::from(kind).to_string());
        }

        self.validated(&Endpoint::Call, &params)?;
        info!(outgoing, "call placed");
        Ok(())
    }

    /// Cancel a call that is still being connected.
    pub fn cancel(&mut self, outgoing: Option<&str>, forwarding: Option<&str>) -> Result<()> {
        let params = Params::new()
            .form("outgoingNumber", outgoing.unwrap_or(UNDEFINED))
            .form("forwardingNumber", forwarding.unwrap_or(UNDEFINED))
            .form("cancelType", "C2C");
        self.validated(&Endpoint::Cancel, &params)?;
        Ok(())
    }

    pub fn send_sms(&mut self, phone_number: &str, text: &str) -> Result<()> {
        let params = Params::new()
            .form("phoneNumber", phone_number)
            .form("text", text);
        self.validated(&Endpoint::Sms, &params)?;
        info!(phone_number, chars = text.chars().count(), "SMS sent");
        Ok(())
    }

    // ========================================================================
    // Folders and search
    // ========================================================================

    pub fn folder(&mut self, feed: Feed) -> Result<Folder> {
        let doc = self.feed(&Endpoint::Feed(feed), &Params::new(), feed.as_str())?;
        Folder::from_feed(&doc)
    }

    /// Search calls, voicemail and SMS history.
    pub fn search(&mut self, query: &str) -> Result<Folder> {
        let doc = self.feed(&Endpoint::Search, &Params::new().query("q", query), "search")?;
        Folder::from_feed(&doc)
    }

    // ========================================================================
    // Message actions
    // ========================================================================

    /// Remove from (or, with `false`, return to) the inbox.
    pub fn archive(&mut self, id: &str, archive: bool) -> Result<()> {
        self.message_action(&Endpoint::Archive, id, "archive", archive)
    }

    /// Move to the trash; `false` moves it back out.
    pub fn delete(&mut self, id: &str, trash: bool) -> Result<()> {
        self.message_action(&Endpoint::Delete, id, "trash", trash)
    }

    pub fn star(&mut self, id: &str, star: bool) -> Result<()> {
        self.message_action(&Endpoint::Star, id, "star", star)
    }

    /// Mark as read (`true`) or unread.
    pub fn mark(&mut self, id: &str, read: bool) -> Result<()> {
        self.message_action(&Endpoint::Mark, id, "read", read)
    }

    fn message_action(&mut self, endpoint: &Endpoint, id: &str, field: &str, value: bool) -> Result<()> {
        let params = Params::new()
            .form("messages", id)
            .form(field, flag(value));
        self.validated(endpoint, &params)?;
        debug!(page = %endpoint.name(), id, value, "message updated");
        Ok(())
    }

    // ========================================================================
    // Downloads
    // ========================================================================

    /// Save the MP3 of a voicemail or recorded call as `<dir>/<id>.mp3`.
    pub fn download(&mut self, id: &str, dir: &Path) -> Result<PathBuf> {
        check_message_id(id)?;

        let response = match self.session.request(&Endpoint::Download(id.to_string()), &Params::new()) {
            Ok(response) => response,
            Err(e @ GvError::Auth(AuthError::NotLoggedIn)) => return Err(e),
            Err(GvError::HttpStatus { status, .. }) => {
                return Err(GvError::Download {
                    id: id.to_string(),
                    reason: format!("HTTP {} (not a voicemail or recording?)", status),
                })
            }
            Err(e) => {
                return Err(GvError::Download {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        if response.body.is_empty() {
            return Err(GvError::Download {
                id: id.to_string(),
                reason: "empty response".into(),
            });
        }

        let path = dir.join(format!("{}.mp3", id));
        std::fs::write(&path, &response.body)?;
        info!(id, path = %path.display(), bytes = response.body.len(), "downloaded");
        Ok(path)
    }

    // ========================================================================
    // Contacts, phones, settings
    // ========================================================================

    /// Contacts feed, fetched once and cached until logout.
    pub fn contacts(&mut self) -> Result<&ContactsFeed> {
        let feed = match self.contacts.take() {
            Some(feed) => feed,
            None => {
                let doc = self.feed(&Endpoint::Contacts, &Params::new(), "contacts")?;
                ContactsFeed::from_feed(&doc)?
            }
        };
        Ok(&*self.contacts.insert(feed))
    }

    /// Forwarding phones attached to the account.
    pub fn phones(&mut self) -> Result<Vec<Phone>> {
        Ok(self.contacts()?.phones.clone())
    }

    pub fn settings(&mut self) -> Result<AccountSettings> {
        Ok(self.contacts()?.settings.clone())
    }

    pub fn enable_phone(&mut self, phone_id: &str) -> Result<()> {
        self.set_forwarding(phone_id, true)
    }

    pub fn disable_phone(&mut self, phone_id: &str) -> Result<()> {
        self.set_forwarding(phone_id, false)
    }

    fn set_forwarding(&mut self, phone_id: &str, enabled: bool) -> Result<()> {
        let params = Params::new()
            .form("enabled", flag(enabled))
            .form("phoneId", phone_id);
        self.validated(&Endpoint::DefaultForward, &params)?;
        // Cached phone flags are stale now
        self.contacts = None;
        info!(phone_id, enabled, "forwarding updated");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn validated(&mut self, endpoint: &Endpoint, params: &Params) -> Result<ActionReply> {
        let response = self.session.request(endpoint, params)?;
        protocol::validate(&endpoint.name(), &response.text())
    }

    fn feed(&mut self, endpoint: &Endpoint, params: &Params, page: &str) -> Result<FeedDocument> {
        let response = self.session.request(endpoint, params)?;
        parse_feed(page, &response.text())
    }
}

//! URL table for the Google Voice web endpoints.
//!
//! None of these are documented by Google; they are what the Voice web app
//! itself calls. Both base URLs are configurable so the client can be pointed
//! at a local server in tests.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{GvError, Result};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.google.com/";
pub const DEFAULT_VOICE_URL: &str = "https://www.google.com/voice/";

/// Message listings served under `inbox/recent/<feed>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Inbox,
    Starred,
    All,
    Spam,
    Trash,
    Voicemail,
    Sms,
    Recorded,
    Placed,
    Received,
    Missed,
}

impl Feed {
    pub const ALL: [Feed; 11] = [
        Feed::Inbox,
        Feed::Starred,
        Feed::All,
        Feed::Spam,
        Feed::Trash,
        Feed::Voicemail,
        Feed::Sms,
        Feed::Recorded,
        Feed::Placed,
        Feed::Received,
        Feed::Missed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feed::Inbox => "inbox",
            Feed::Starred => "starred",
            Feed::All => "all",
            Feed::Spam => "spam",
            Feed::Trash => "trash",
            Feed::Voicemail => "voicemail",
            Feed::Sms => "sms",
            Feed::Recorded => "recorded",
            Feed::Placed => "placed",
            Feed::Received => "received",
            Feed::Missed => "missed",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feed {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Feed::ALL
            .iter()
            .copied()
            .find(|feed| feed.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Feed::ALL.iter().map(|f| f.as_str()).collect();
                format!("unknown feed '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Every page the client knows how to reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    LoginPost,
    SmsAuth,
    Logout,
    Inbox,
    Call,
    Cancel,
    DefaultForward,
    Delete,
    Archive,
    Mark,
    Star,
    Sms,
    /// Voicemail / recording media for a message id.
    Download(String),
    Search,
    Contacts,
    Feed(Feed),
}

impl Endpoint {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> String {
        match self {
            Endpoint::Login => "login".into(),
            Endpoint::LoginPost => "login_post".into(),
            Endpoint::SmsAuth => "smsauth".into(),
            Endpoint::Logout => "logout".into(),
            Endpoint::Inbox => "inbox_page".into(),
            Endpoint::Call => "call".into(),
            Endpoint::Cancel => "cancel".into(),
            Endpoint::DefaultForward => "default_forward".into(),
            Endpoint::Delete => "delete".into(),
            Endpoint::Archive => "archive".into(),
            Endpoint::Mark => "mark".into(),
            Endpoint::Star => "star".into(),
            Endpoint::Sms => "sms".into(),
            Endpoint::Download(_) => "download".into(),
            Endpoint::Search => "search".into(),
            Endpoint::Contacts => "contacts".into(),
            Endpoint::Feed(feed) => feed.to_string(),
        }
    }
}

/// Resolved base URLs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    accounts: Url,
    voice: Url,
}

impl Endpoints {
    pub fn new(accounts_url: &str, voice_url: &str) -> Result<Self> {
        Ok(Self {
            accounts: parse_base(accounts_url)?,
            voice: parse_base(voice_url)?,
        })
    }

    /// The public Google endpoints.
    pub fn google() -> Result<Self> {
        Self::new(DEFAULT_ACCOUNTS_URL, DEFAULT_VOICE_URL)
    }

    pub fn voice_base(&self) -> &Url {
        &self.voice
    }

    /// Absolute URL for an endpoint.
    pub fn url(&self, endpoint: &Endpoint) -> Url {
        match endpoint {
            Endpoint::Login => {
                let mut url = self.accounts_path("ServiceLogin");
                let target = self.voice.as_str().trim_end_matches('/').to_string();
                url.query_pairs_mut()
                    .append_pair("service", "grandcentral")
                    .append_pair("continue", &target);
                url
            }
            Endpoint::LoginPost => self.accounts_path("ServiceLoginAuth"),
            Endpoint::SmsAuth => self.accounts_path("SmsAuth"),
            Endpoint::Logout => self.voice_path("account/signout"),
            // The web app routes `#inbox` client-side; the fragment is never sent.
            Endpoint::Inbox => self.voice.clone(),
            Endpoint::Call => self.voice_path("call/connect/"),
            Endpoint::Cancel => self.voice_path("call/cancel/"),
            Endpoint::DefaultForward => self.voice_path("settings/editDefaultForwarding/"),
            Endpoint::Delete => self.voice_path("inbox/deleteMessages/"),
            Endpoint::Archive => self.voice_path("inbox/archiveMessages/"),
            Endpoint::Mark => self.voice_path("inbox/mark/"),
            Endpoint::Star => self.voice_path("inbox/star/"),
            Endpoint::Sms => self.voice_path("sms/send/"),
            Endpoint::Download(id) => self.voice_path(&format!("media/send_voicemail/{}", id)),
            Endpoint::Search => self.voice_path("inbox/search/"),
            Endpoint::Contacts => self.voice_path("contacts/"),
            Endpoint::Feed(feed) => self.voice_path(&format!("inbox/recent/{}/", feed)),
        }
    }

    /// True when `url` is the sign-in page, i.e. the service bounced us out.
    pub fn is_sign_in(&self, url: &Url) -> bool {
        same_page(url, &self.url(&Endpoint::Login))
    }

    /// True when `url` is the SMS verification page of two-step sign-in.
    pub fn is_sms_auth(&self, url: &Url) -> bool {
        same_page(url, &self.url(&Endpoint::SmsAuth))
    }

    fn accounts_path(&self, path: &str) -> Url {
        join(&self.accounts, path)
    }

    fn voice_path(&self, path: &str) -> Url {
        join(&self.voice, path)
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    // Endpoint paths are appended to the base path, so it must end with '/'.
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| GvError::Config(format!("invalid base URL '{}': {}", raw, e)))
}

fn join(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}{}", base.path(), path);
    url.set_path(&joined);
    url
}

fn same_page(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin() && a.path() == b.path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let endpoints = Endpoints::google().unwrap();
        assert_eq!(
            endpoints.url(&Endpoint::Call).as_str(),
            "https://www.google.com/voice/call/connect/"
        );
        assert_eq!(
            endpoints.url(&Endpoint::Feed(Feed::Voicemail)).as_str(),
            "https://www.google.com/voice/inbox/recent/voicemail/"
        );
        assert_eq!(
            endpoints.url(&Endpoint::Download("abc123".into())).as_str(),
            "https://www.google.com/voice/media/send_voicemail/abc123"
        );
    }

    #[test]
    fn test_login_url_carries_service_and_continue() {
        let url = Endpoints::google().unwrap().url(&Endpoint::Login);
        assert_eq!(url.path(), "/ServiceLogin");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("service".into(), "grandcentral".into())));
        assert!(pairs.contains(&("continue".into(), "https://www.google.com/voice".into())));
    }

    #[test]
    fn test_base_without_trailing_slash() {
        let endpoints = Endpoints::new("http://127.0.0.1:9999", "http://127.0.0.1:9999/voice").unwrap();
        assert_eq!(
            endpoints.url(&Endpoint::Sms).as_str(),
            "http://127.0.0.1:9999/voice/sms/send/"
        );
        assert_eq!(
            endpoints.url(&Endpoint::SmsAuth).as_str(),
            "http://127.0.0.1:9999/SmsAuth"
        );
    }

    #[test]
    fn test_invalid_base_is_config_error() {
        let err = Endpoints::new("not a url", DEFAULT_VOICE_URL).unwrap_err();
        assert!(matches!(err, GvError::Config(_)));
    }

    #[test]
    fn test_sign_in_detection_ignores_query() {
        let endpoints = Endpoints::google().unwrap();
        let bounced = Url::parse("https://accounts.google.com/ServiceLogin?passive=true").unwrap();
        assert!(endpoints.is_sign_in(&bounced));
        let auth_post = Url::parse("https://accounts.google.com/ServiceLoginAuth").unwrap();
        assert!(!endpoints.is_sign_in(&auth_post));
        let sms = Url::parse("https://accounts.google.com/SmsAuth?continue=x").unwrap();
        assert!(endpoints.is_sms_auth(&sms));
    }

    #[test]
    fn test_feed_from_str() {
        assert_eq!("Voicemail".parse::<Feed>().unwrap(), Feed::Voicemail);
        assert!("outbox".parse::<Feed>().is_err());
        for feed in Feed::ALL {
            assert_eq!(feed.as_str().parse::<Feed>().unwrap(), feed);
        }
    }
}

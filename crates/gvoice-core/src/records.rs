//! Typed projections of feed data: folders, messages, phones, contacts.
//!
//! The JSON behind these is whatever the Voice web app happens to use, so
//! everything except message ids and timestamps is optional and unknown
//! fields are ignored.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::endpoints::{Endpoint, Endpoints};
use crate::error::{GvError, Result};
use crate::feed::FeedDocument;

/// Format of `displayStartDateTime`, e.g. `01/31/10 4:05 PM`.
pub const DISPLAY_DATE_FORMAT: &str = "%m/%d/%y %I:%M %p";

// ============================================================================
// Lenient field helpers
// ============================================================================

/// Ids show up as both numbers and strings.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!("expected id, got {}", other))),
    }
}

/// Voice sends `null` for fields it has nothing for; treat that like a
/// missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Epoch milliseconds, as a number or a numeric string.
fn parse_millis(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Seconds, as a number, a numeric string, or `m:ss` / `h:mm:ss`.
pub fn parse_duration(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<u32>() {
                return Some(secs);
            }
            let mut total: u32 = 0;
            for part in s.split(':') {
                let n: u32 = part.parse().ok()?;
                total = total.checked_mul(60)?.checked_add(n)?;
            }
            if s.contains(':') {
                Some(total)
            } else {
                None
            }
        }
        _ => None,
    }
}

// ============================================================================
// Messages and folders
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    phone_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    display_number: String,
    #[serde(default)]
    start_time: Value,
    #[serde(default)]
    display_start_date_time: Option<String>,
    #[serde(default)]
    relative_start_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    note: String,
    #[serde(default)]
    children: Value,
    #[serde(default)]
    message_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    is_read: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    is_spam: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    is_trash: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    star: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    labels: Vec<String>,
    #[serde(default, rename = "type")]
    kind: Option<i64>,
    #[serde(default)]
    duration: Value,
}

/// A call, voicemail, recording or SMS thread from a feed.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// SHA1 identifier
    pub id: String,
    pub phone_number: String,
    pub display_number: String,
    pub start_time: DateTime<Utc>,
    /// Local wall-clock time as Voice displays it
    pub display_start_date_time: Option<NaiveDateTime>,
    pub relative_start_time: Option<String>,
    pub note: String,
    /// Conversation markup for threaded messages, as Voice sends it
    #[serde(skip_serializing_if = "String::is_empty")]
    pub children: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub is_read: bool,
    pub is_spam: bool,
    pub is_trash: bool,
    pub starred: bool,
    pub labels: Vec<String>,
    /// Voice's numeric message type
    pub kind: Option<i64>,
    /// Length in seconds (calls, voicemail, recordings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl Message {
    fn from_raw(page: &str, id: String, raw: RawMessage) -> Result<Self> {
        let start_time = parse_millis(&raw.start_time).ok_or_else(|| {
            GvError::parse(page, format!("message {} has bad startTime {}", id, raw.start_time))
        })?;
        let display_start_date_time = raw
            .display_start_date_time
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), DISPLAY_DATE_FORMAT).ok());

        Ok(Self {
            id,
            phone_number: raw.phone_number,
            display_number: raw.display_number,
            start_time,
            display_start_date_time,
            relative_start_time: raw.relative_start_time,
            note: raw.note,
            children: match raw.children {
                Value::Null => String::new(),
                Value::String(s) => s,
                other => other.to_string(),
            },
            text: raw.message_text,
            is_read: raw.is_read,
            is_spam: raw.is_spam,
            is_trash: raw.is_trash,
            starred: raw.star,
            labels: raw.labels,
            kind: raw.kind,
            duration_secs: parse_duration(&raw.duration),
        })
    }

    /// Who the message is from, as Voice displays it.
    pub fn sender(&self) -> &str {
        if self.display_number.is_empty() {
            &self.phone_number
        } else {
            &self.display_number
        }
    }

    pub fn display_start_time(&self) -> Option<NaiveTime> {
        self.display_start_date_time.map(|dt| dt.time())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Where the voicemail or recording audio can be fetched.
    pub fn media_url(&self, endpoints: &Endpoints) -> Url {
        endpoints.url(&Endpoint::Download(self.id.clone()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Message #{} ({})>", self.id, self.phone_number)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFolder {
    #[serde(default)]
    messages: BTreeMap<String, RawMessage>,
    #[serde(default)]
    total_size: u64,
    #[serde(default)]
    unread_counts: BTreeMap<String, u64>,
    #[serde(default)]
    results_per_page: u64,
}

/// One feed response: counters plus its messages, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub name: String,
    pub total_size: u64,
    pub unread_counts: BTreeMap<String, u64>,
    pub results_per_page: u64,
    pub messages: Vec<Message>,
}

impl Folder {
    pub fn from_feed(doc: &FeedDocument) -> Result<Self> {
        let raw: RawFolder = doc.data()?;

        let mut messages = raw
            .messages
            .into_iter()
            .map(|(id, msg)| Message::from_raw(&doc.page, id, msg))
            .collect::<Result<Vec<_>>>()?;
        messages.sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| a.id.cmp(&b.id)));

        Ok(Self {
            name: doc.page.clone(),
            total_size: raw.total_size,
            unread_counts: raw.unread_counts,
            results_per_page: raw.results_per_page,
            messages,
        })
    }

    /// Total messages on the server (not just this page).
    pub fn len(&self) -> u64 {
        self.total_size
    }

    pub fn is_empty(&self) -> bool {
        self.total_size == 0
    }

    pub fn unread(&self, label: &str) -> u64 {
        self.unread_counts.get(label).copied().unwrap_or(0)
    }

    pub fn find(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Folder {} ({})>", self.name, self.total_size)
    }
}

// ============================================================================
// Contacts feed: phones, contacts, settings
// ============================================================================

/// Kind of forwarding phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum PhoneType {
    Home,
    Mobile,
    Work,
    Gizmo,
    Other(u8),
}

impl From<u8> for PhoneType {
    fn from(value: u8) -> Self {
        match value {
            1 => PhoneType::Home,
            2 => PhoneType::Mobile,
            3 => PhoneType::Work,
            7 => PhoneType::Gizmo,
            other => PhoneType::Other(other),
        }
    }
}

impl From<PhoneType> for u8 {
    fn from(value: PhoneType) -> Self {
        match value {
            PhoneType::Home => 1,
            PhoneType::Mobile => 2,
            PhoneType::Work => 3,
            PhoneType::Gizmo => 7,
            PhoneType::Other(other) => other,
        }
    }
}

impl Default for PhoneType {
    fn default() -> Self {
        PhoneType::Other(0)
    }
}

impl fmt::Display for PhoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneType::Home => f.write_str("home"),
            PhoneType::Mobile => f.write_str("mobile"),
            PhoneType::Work => f.write_str("work"),
            PhoneType::Gizmo => f.write_str("gizmo"),
            PhoneType::Other(n) => write!(f, "type {}", n),
        }
    }
}

/// A phone attached to the account for call forwarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formatted_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, rename = "type")]
    pub phone_type: PhoneType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sms_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phone_number)
    }
}

/// Partial Google contact data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, deserialize_with = "string_or_number")]
    pub contact_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_number: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Account settings as Voice reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountSettings(pub Map<String, Value>);

impl AccountSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The account's Google Voice number.
    pub fn primary_did(&self) -> Option<&str> {
        self.get("primaryDid").and_then(Value::as_str)
    }

    pub fn language(&self) -> Option<&str> {
        self.get("language").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawContactsFeed {
    #[serde(default)]
    contacts: BTreeMap<String, Contact>,
    #[serde(default)]
    phones: BTreeMap<String, Phone>,
    #[serde(default)]
    settings: AccountSettings,
}

/// Everything the contacts page reports.
#[derive(Debug, Clone, Serialize)]
pub struct ContactsFeed {
    pub contacts: Vec<Contact>,
    pub phones: Vec<Phone>,
    pub settings: AccountSettings,
}

impl ContactsFeed {
    pub fn from_feed(doc: &FeedDocument) -> Result<Self> {
        let raw: RawContactsFeed = doc.data()?;
        let contacts = raw
            .contacts
            .into_iter()
            .map(|(key, mut contact)| {
                if contact.contact_id.is_empty() {
                    contact.contact_id = key;
                }
                contact
            })
            .collect();

        Ok(Self {
            contacts,
            phones: raw.phones.into_values().collect(),
            settings: raw.settings,
        })
    }

    pub fn phone(&self, id: &str) -> Option<&Phone> {
        self.phones.iter().find(|p| p.id == id)
    }
}

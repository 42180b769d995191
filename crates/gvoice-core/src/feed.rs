//! Parser for Voice's XML-wrapped feeds.
//!
//! Feed endpoints answer with an XML envelope whose `<json>` element holds
//! the data and whose `<html>` element holds the pre-rendered markup the web
//! app would insert:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <response>
//!   <json><![CDATA[{"messages": {...}, "totalSize": 3}]]></json>
//!   <html><![CDATA[<div>...</div>]]></html>
//! </response>
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;

use crate::error::{GvError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Json,
    Html,
}

/// The two payloads of one feed response.
#[derive(Debug, Clone, Default)]
pub struct FeedDocument {
    pub page: String,
    pub json: String,
    pub html: String,
}

impl FeedDocument {
    /// Deserialize the `<json>` payload.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        if self.json.trim().is_empty() {
            return Err(GvError::parse(&self.page, "feed has no <json> payload"));
        }
        serde_json::from_str(&self.json)
            .map_err(|e| GvError::parse(&self.page, format!("invalid feed JSON: {}", e)))
    }

    fn push(&mut self, part: Part, data: &str) {
        match part {
            Part::Json => self.json.push_str(data),
            Part::Html => self.html.push_str(data),
        }
    }
}

/// Dig the json and html payloads out of a feed response.
pub fn parse_feed(page: &str, xml: &str) -> Result<FeedDocument> {
    let mut reader = Reader::from_str(xml);
    let mut doc = FeedDocument {
        page: page.to_string(),
        ..FeedDocument::default()
    };
    // Payload being collected and how deep inside it the reader is.
    // Text of elements nested in a payload belongs to that payload.
    let mut current: Option<(Part, usize)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = match current {
                    Some((part, depth)) => Some((part, depth + 1)),
                    None => match e.name().as_ref() {
                        b"json" => Some((Part::Json, 0)),
                        b"html" => Some((Part::Html, 0)),
                        _ => None,
                    },
                };
            }
            Ok(Event::End(_)) => {
                current = match current {
                    Some((part, depth)) if depth > 0 => Some((part, depth - 1)),
                    _ => None,
                };
            }
            Ok(Event::Text(text)) => {
                if let Some((part, _)) = current {
                    let text = text
                        .unescape()
                        .map_err(|e| GvError::parse(page, format!("bad XML text: {}", e)))?;
                    doc.push(part, &text);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some((part, _)) = current {
                    let raw = cdata.into_inner();
                    doc.push(part, &String::from_utf8_lossy(&raw));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GvError::parse(
                    page,
                    format!("malformed XML at position {}: {}", reader.buffer_position(), e),
                ))
            }
            _ => {}
        }
    }

    Ok(doc)
}

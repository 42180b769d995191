//! Client library for the Google Voice web endpoints.
//!
//! [`Session`] handles sign-in (including SMS two-step verification), the
//! cookie jar and the `_rnr_se` page token. [`Voice`] sits on top of it and
//! exposes calls, SMS, folders, message actions, downloads and the contacts
//! feed as typed results.
//!
//! ```no_run
//! use gvoice_core::{Config, Credentials, Feed, Voice};
//!
//! # fn main() -> gvoice_core::Result<()> {
//! let config = Config::load_default()?;
//! let mut voice = Voice::new(&config)?;
//! voice.login(&Credentials::new("me@example.com", "secret"))?;
//!
//! voice.send_sms("+14155551234", "running late")?;
//! for message in voice.folder(Feed::Voicemail)?.messages {
//!     println!("{} {}", message.start_time, message.sender());
//! }
//!
//! voice.logout();
//! # Ok(())
//! # }
//! ```
//!
//! The endpoints are undocumented and change without notice; every response
//! is parsed defensively and unexpected shapes surface as
//! [`GvError::Parse`].

pub mod config;
pub mod endpoints;
pub mod error;
pub mod feed;
pub mod protocol;
pub mod records;
pub mod session;
pub mod verify;
pub mod voice;

// Re-export commonly used types
pub use config::{AuthConfig, CallConfig, Config, ServiceConfig};
pub use endpoints::{Endpoint, Endpoints, Feed};
pub use error::{AuthError, ErrorKind, GvError, Result};
pub use records::{AccountSettings, Contact, ContactsFeed, Folder, Message, Phone, PhoneType};
pub use session::{Credentials, Params, RawResponse, Session, SessionState, Token};
pub use verify::{CodeSource, FixedCode, NoCode, Oathtool};
pub use voice::Voice;

//! Command implementations.
//!
//! Each command takes an already signed-in [`gvoice_core::Voice`]; `main`
//! owns login and logout around them.

pub mod account;
pub mod calls;
pub mod folders;
pub mod messages;
pub mod messaging;

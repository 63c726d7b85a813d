//! Form-to-Telegram relay and daily reminder sender.
//!
//! Two binaries share this library: `formrelay` serves the web form and
//! forwards each submission as a chat message, and `daily-sender` posts a
//! reminder once a day. They never talk to each other.

pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod platform;
pub mod relay;
pub mod scheduler;
pub mod signal;

//! Offline-first daily puzzle client.
//!
//! Games are played locally and saved after every move. Finished solves go
//! into a durable queue that is uploaded to the score service whenever the
//! device is online and logged in.

pub mod api;
pub mod config;
pub mod daily;
pub mod encryption;
pub mod error;
pub mod render;
pub mod session;
pub mod store;
pub mod sync;

pub use api::{HttpScoreApi, ScoreApi};
pub use config::ClientConfig;
pub use daily::{Completion, DailyClient};
pub use error::{ClientError, Result};
pub use session::Session;
pub use sync::{Connectivity, FlushReport, SyncQueue};

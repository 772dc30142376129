//! arxiv-titler arXiv side: ID extraction, metadata lookup, page sessions.

pub mod citation;
pub mod client;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod parser;
pub mod session;
pub mod signal;

pub use client::ArxivClient;
pub use error::{ArxivError, Result};
pub use identifiers::{ArxivId, TimeBucket, extract_id, extract_time_bucket, parse_location};
pub use session::{
    PageHandle, ReassertHandle, Session, SessionOptions, open_session, schedule_reassert,
    spawn_page,
};
pub use signal::InboundSignal;

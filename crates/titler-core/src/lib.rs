//! arxiv-titler core: page DOM, title injection, backoff, rich clipboard.

pub mod backoff;
pub mod clipboard;
pub mod config;
pub mod dom;
pub mod error;
pub mod inject;
pub mod page;

pub use backoff::BackoffSchedule;
pub use clipboard::{
    Clipboard, ClipboardSegment, Emphasis, MemoryClipboard, RichContent, SystemClipboard,
    build_and_copy,
};
pub use config::TitlerConfig;
pub use dom::{Document, NodeId};
pub use error::{Result, TitlerError};
pub use inject::inject_title;
pub use page::{Location, Page, TITLE_PLACEHOLDER};

//! Clipboard domain models.
mod record;

pub use record::{ClipboardRecord, NewClipboardRecord, RecordError, MAX_CONTENT_CHARS};

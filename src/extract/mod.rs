//! HTML parsing and readable-text extraction for fetched pages.

mod html;
mod readability;
mod text;

pub use html::{collapse_whitespace, decode_entities, Document, NodeId, NodeKind};
pub use readability::{extract, Article, ExtractError, NO_TITLE};

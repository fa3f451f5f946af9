//! Value extraction from browser pages
//!
//! `IndexerPage` abstracts the browser; `PageExtractor` runs indexer chains
//! on top of it and hands raw text to the selector pipeline.

pub mod chromium_page;
pub mod extractor;
pub mod js_scripts;
pub mod json_path;
pub mod page;

pub use chromium_page::{ChromiumPage, PageTimeouts};
pub use extractor::{ExtractorSettings, PageExtractor};
pub use page::{IndexerPage, QueryKind};

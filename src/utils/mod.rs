pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{apply_search_params, connection_url, is_valid_url, resolve_link};

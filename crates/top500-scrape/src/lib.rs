//! Scrape layer: HTTP fetch of TOP500 system pages and HTML table parsing.

mod fetch;
mod page;
pub mod ranking;
pub mod table;

pub use fetch::{FetchError, PageSource, Top500Fetcher};
pub use page::{ParseError, parse_record};

pub mod dom;
pub mod error;
pub mod extract;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod pipeline;
pub mod sanitize;
pub mod store;

pub use dom::{Element, Fragment, Node};
pub use error::{LegibleError, Result};
pub use extract::{ExtractConfig, ExtractedPage, extract_page};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, FetchedPage, HttpFetcher, PageFetcher, fetch_page};
#[cfg(feature = "fetch")]
pub use pipeline::Pipeline;
pub use pipeline::{CleanedPage, clean_page};
pub use sanitize::{SanitizeConfig, sanitize_fragment, sanitize_fragment_with};
pub use store::{MemoryStore, PageRecord, RecordStatus, RecordStore, RecordUpdate};

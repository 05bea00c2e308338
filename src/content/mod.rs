//! Article content pipeline: fetch a page, repair its images, extract the
//! readable body, and re-anchor stored highlights on render.

pub mod anchor;
pub mod fetch;
pub mod normalize;

pub use anchor::apply_highlights;
pub use fetch::{fetch_page, PageFetchError};
pub use normalize::{normalize, NormalizeError, NormalizedArticle};

//! Suffix array over the old buffer
//!
//! The delta encoder looks up every position of the new buffer in this index
//! to find the longest matching run in the old buffer.
//!
//! ## Architecture
//!
//! - `builder`: Sorts all suffixes by rank doubling
//! - `search`: Longest-match binary search
//! - `types`: The finished index and search results

pub mod builder;
pub mod search;
pub mod types;

// Re-exports for convenience
pub use builder::SuffixArrayBuilder;
pub use search::match_len;
pub use types::{SuffixIndex, SuffixMatch};

//! HTTP protocol layer module
//!
//! Protocol helpers kept apart from asset lookup: content types, cache
//! validators, byte ranges and response builders.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use range::{parse_range_header, RangeParseResult};
pub use response::{
    build_304_response, build_405_response, build_416_response, build_asset_response,
    build_error_response, build_partial_response, AssetHeaders,
};

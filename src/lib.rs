//! VibeCrossing asset server
//!
//! Serves the game's prebuilt `dist/` directory over HTTP/1.1: `/` answers
//! with `index.html`, every other path with the matching file under the
//! asset root. Requests that would leave the root are refused.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

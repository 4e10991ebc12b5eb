//! Web interface module
//!
//! Exposes the store over HTTP: `/get`, `/set`, `/update` and `/delete`.
//! Store errors are mapped to status codes here and nowhere else.

mod duration;
mod handlers;
mod server;

pub use duration::parse_duration;
pub use handlers::{AppState, DataResponse, KeyValueRequest, StatusResponse};
pub use server::{router, run_web_server};

//! HTTP server: shared state, listener loop and request dispatch

pub mod http;

pub use http::{dispatch, run, AppState};

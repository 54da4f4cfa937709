#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! The metrics server: HTTP front, ingestion handlers, and the merge/ingest core built
//! on top of `server-storage`'s pluggable backends.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod state;

use anyhow as _;
use tokio as _;
#[cfg(test)]
use tower as _;

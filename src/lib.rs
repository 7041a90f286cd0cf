//! Job board: browse, filter and apply to listings; post and moderate them.
//!
//! The listing search lives in [`filter`], [`sort`] and [`pipeline`]; everything
//! else feeds listings in (store, import, posting form) or presents them.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod deeplink;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod posting;
pub mod render;
pub mod sample;
pub mod sort;
pub mod tui;

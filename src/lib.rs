//! Audio labeling service
//!
//! Hands audio clips stored in S3-compatible object storage to human
//! labelers, one at a time, and records their labels in PostgreSQL. The
//! interesting part is [`services::selector`], which decides which clip to
//! serve next.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

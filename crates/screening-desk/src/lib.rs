//! Operator-side core for the screening dashboard.
//!
//! The backend owns scraping, captcha handling, persistence and report
//! generation. This crate decides what to ask it for (criteria, field rules,
//! query items), talks to it over HTTP, and tracks submitted jobs until they
//! reach a terminal state.

pub mod client;
pub mod config;
pub mod criteria;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod items;
pub mod jobs;
pub mod telemetry;

//! Framework-disclosure detection and chunked analysis routing for long
//! sustainability reports.

pub mod aggregate;
pub mod analysis;
pub mod chunking;
pub mod config;
pub mod engine;
pub mod extract;
pub mod frameworks;
pub mod model;
pub mod router;
pub mod sections;
pub mod util;

//! Infrastructure adapters and runtime bootstrap.

pub mod cms;
pub mod error;
pub mod http;
pub mod instagram;
pub mod smtp;
pub mod store;
pub mod telemetry;

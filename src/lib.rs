//! Content backend for a CMS-driven marketing site.
//!
//! The crate is layered: `domain` holds plain records and validation,
//! `application` holds the services (content gateway, preview gate,
//! feedback, contact relay, feed proxy), `cache` holds the TTL store they
//! share, and `infra` holds the outward-facing adapters (HTTP surface, CMS
//! and Instagram clients, SMTP transport, file store, telemetry).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

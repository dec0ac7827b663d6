//! Domain records and validation.

pub mod contact;
pub mod content;
pub mod error;
pub mod feedback;
pub mod instagram;

//! Application services layer.

pub mod contact;
pub mod content;
pub mod error;
pub mod feedback;
pub mod instagram;
pub mod preview;
pub mod revalidate;

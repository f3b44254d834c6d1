//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Path-ordered, hash-based duplicate classification ([`classifier`])
//! - Regrouping classified records per original ([`groups`])

pub mod classifier;
pub mod groups;

pub use classifier::{classify, path_order};
pub use groups::{group_duplicates, DuplicateGroup};

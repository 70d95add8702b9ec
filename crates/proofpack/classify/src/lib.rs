#![deny(unsafe_code)]
//! # proofpack-classify
//!
//! Maps artifact paths to disclosure tiers with an ordered glob rule table.
//!
//! ## Key Types
//!
//! - [`DisclosureClassifier`] — first-match rule evaluation, fails closed to `Private`
//! - [`PathPattern`] — anchored glob over `/`-separated relative paths
//! - [`default_rules`] — built-in table for research artifact trees

pub mod classifier;
pub mod pattern;

pub use classifier::{default_rules, DisclosureClassifier};
pub use pattern::PathPattern;

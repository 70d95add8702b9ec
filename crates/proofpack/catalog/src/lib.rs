#![deny(unsafe_code)]
//! # proofpack-catalog
//!
//! Walks an artifact source, hashes and classifies every artifact, and
//! produces an immutable path-sorted [`Catalog`].
//!
//! ## Key Types
//!
//! - [`ArtifactSource`] — read-only artifact set (`FsSource`, `MemorySource`)
//! - [`CatalogScanner`] — bounded parallel hashing into a catalog
//! - [`Catalog`] — sorted, duplicate-free entry list

pub mod catalog;
pub mod scanner;
pub mod source;

pub use catalog::Catalog;
pub use scanner::{read_verified, CatalogScanner};
pub use source::{ArtifactMeta, ArtifactSource, FsSource, MemorySource};

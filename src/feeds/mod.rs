//! Syndication feed retrieval.
//!
//! - [`parse`]: RSS 2.0, RSS 1.0 and Atom parsing into normalized entries
//! - [`fetch`]: HTTP retrieval of every registered source with per-source
//!   failure isolation

pub mod fetch;
pub mod parse;

pub use fetch::Fetcher;

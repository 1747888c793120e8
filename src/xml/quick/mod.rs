//! Quick-xml helper utilities for report design parsing.
//!
//! This module provides ergonomic wrappers around quick-xml's low-level APIs
//! to reduce boilerplate in the deserialize modules.

pub mod de;

pub use de::{Attrs, Node, XmlCursor, skip_element};

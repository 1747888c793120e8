//! Reader for report design documents.
//!
//! A design is a tree of report items. Items can extend templates defined in
//! the `components` slot; extending an item copies the template's structure
//! into it as *virtual* children, and the document records changes to those
//! children as overridden values keyed by base id. This crate reads such
//! documents into a [`ReportDesign`], applying templates and overrides and
//! collecting non-fatal [`Diagnostic`]s along the way.

pub mod core;
pub mod model;
pub mod xml;

#[cfg(test)]
mod test_utils;

pub use crate::core::{BaseId, DesignVersion, ElementId};
pub use crate::model::{
    BaseIdMap, Element, ElementHandle, ElementKind, PropertyValue, ReportDesign, Slot, Structure,
};
pub use crate::xml::{Diagnostic, ParseError, ParseOptions, SemanticError, Severity};

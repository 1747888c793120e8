pub mod defn;
pub mod design;
pub mod element;
pub mod structure;

pub use defn::{ElementDefn, ElementKind, props};
pub use design::{ReportDesign, Slot};
pub use element::{Element, ElementHandle, PropertyValue, Structure};
pub use structure::{BaseIdMap, duplicate_structure, extend_element};

pub mod element_id;
pub mod version;

pub use element_id::{BaseId, ElementId, IdParseError};
pub use version::{DesignVersion, VersionParseError};

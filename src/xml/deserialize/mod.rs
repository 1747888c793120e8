//! XML deserialization module.
//!
//! This module reads report designs with quick-xml in a single pass. Each
//! tag kind is handled by a function that consumes the tag's content and
//! returns when it reaches the matching end tag; shared state (the design
//! under construction, diagnostics, pending extensions) travels in a
//! [`ParserContext`].

pub mod element;
pub mod overrides;
pub mod properties;
pub mod style;

pub use overrides::{DeferredOverride, OverrideFrame, RefEntry, RefEntryAttrs};
pub use style::StyleState;

use std::io::BufRead;
use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use crate::core::ElementId;
use crate::model::{ElementHandle, ElementKind, ReportDesign, Slot};
use crate::xml::ParseOptions;
use crate::xml::errors::{ErrorContext, ErrorHandler, SemanticError};
use crate::xml::quick::{Node, XmlCursor};

/// Errors that can occur during XML deserialization.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Deserialization error: {0}")]
    Custom(String),
    #[error("Unexpected end of XML")]
    UnexpectedEof,
    #[error("Unexpected element: expected {expected}, found {found}")]
    UnexpectedElement { expected: String, found: String },
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Closed set of tags the parser understands. Anything else is `Unknown`
/// and gets skipped along with its subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Report,
    Styles,
    Components,
    Body,
    Element(ElementKind),
    Property,
    Expression,
    ListProperty,
    Structure,
    OverriddenValues,
    RefEntry,
    Unknown,
}

impl TagKind {
    /// Classify a tag name, ignoring ASCII case.
    pub fn from_name(name: &[u8]) -> Self {
        let Ok(name) = std::str::from_utf8(name) else {
            return TagKind::Unknown;
        };
        match name.to_ascii_lowercase().as_str() {
            "report" | "library" => TagKind::Report,
            "styles" => TagKind::Styles,
            "components" => TagKind::Components,
            "body" => TagKind::Body,
            "property" => TagKind::Property,
            "expression" => TagKind::Expression,
            "list-property" => TagKind::ListProperty,
            "structure" => TagKind::Structure,
            "overridden-values" => TagKind::OverriddenValues,
            "ref-entry" => TagKind::RefEntry,
            other => ElementKind::from_tag(other)
                .map(TagKind::Element)
                .unwrap_or(TagKind::Unknown),
        }
    }

    /// Tags handled by the generic property parser.
    pub fn is_property(self) -> bool {
        matches!(
            self,
            TagKind::Property | TagKind::Expression | TagKind::ListProperty
        )
    }
}

/// An element whose template could not be applied when it was read.
#[derive(Debug, Clone)]
pub(crate) struct PendingExtension {
    pub(crate) owner: ElementHandle,
    pub(crate) reference: Option<String>,
    pub(crate) overrides: Vec<DeferredOverride>,
}

/// State shared by every handler during one parse.
pub(crate) struct ParserContext {
    pub(crate) design: ReportDesign,
    options: ParseOptions,
    errors: ErrorHandler,
    pending: Vec<PendingExtension>,
    position: Option<usize>,
    file_path: Option<PathBuf>,
}

impl ParserContext {
    pub(crate) fn new(options: ParseOptions) -> Self {
        Self::with_design(ReportDesign::new(options.default_version), options)
    }

    pub(crate) fn with_design(design: ReportDesign, options: ParseOptions) -> Self {
        Self {
            design,
            options,
            errors: ErrorHandler::new(),
            pending: Vec::new(),
            position: None,
            file_path: None,
        }
    }

    pub(crate) fn set_file_path(&mut self, path: PathBuf) {
        self.file_path = Some(path);
    }

    /// Record where in the input subsequent diagnostics come from.
    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = Some(position);
    }

    pub(crate) fn clear_position(&mut self) {
        self.position = None;
    }

    fn context(&self, parsing: &str) -> ErrorContext {
        ErrorContext {
            file_path: self.file_path.clone(),
            position: self.position,
            parsing: Some(parsing.to_string()),
        }
    }

    pub(crate) fn semantic_error(&mut self, error: SemanticError, parsing: &str) {
        let context = self.context(parsing);
        self.errors.semantic_error(error, context);
    }

    pub(crate) fn semantic_warning(&mut self, error: SemanticError, parsing: &str) {
        let context = self.context(parsing);
        self.errors.semantic_warning(error, context);
    }

    pub(crate) fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    /// Whether the document's version makes duplicate ids an error.
    pub(crate) fn enforces_unique_ids(&self) -> bool {
        self.design.version() >= self.options.strict_id_version
    }

    /// Give `element` the id `id`.
    ///
    /// A clash with a different element is reported for strict documents,
    /// but the id is assigned either way.
    pub(crate) fn assign_element_id(&mut self, element: ElementHandle, id: ElementId) {
        if let Some(existing) = self.design.get_element_by_id(id) {
            if existing != element && self.enforces_unique_ids() {
                let owner = self.design.identifier(existing);
                let requester = self.design.identifier(element);
                self.semantic_error(
                    SemanticError::DuplicateElementId {
                        id,
                        owner,
                        requester,
                    },
                    "element id",
                );
            }
        }
        self.design.set_element_id(element, id);
    }

    /// Parse and assign the `id` attribute of an element read from the document.
    pub(crate) fn read_element_id(&mut self, element: ElementHandle, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        match raw.parse::<ElementId>() {
            Ok(id) => self.assign_element_id(element, id),
            Err(err) => {
                debug!("rejected id '{}': {}", raw, err);
                let identifier = self.design.identifier(element);
                self.semantic_error(
                    SemanticError::InvalidElementId {
                        element: identifier,
                        value: raw.to_string(),
                    },
                    "element id",
                );
            }
        }
    }

    pub(crate) fn is_pending(&self, element: ElementHandle) -> bool {
        self.pending.iter().any(|p| p.owner == element)
    }

    pub(crate) fn defer_extension(&mut self, pending: PendingExtension) {
        self.pending.push(pending);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PendingExtension> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn finish(self) -> ReportDesign {
        let mut design = self.design;
        design.diagnostics = self.errors.into_diagnostics();
        design
    }
}

/// Deserialize a whole design document.
///
/// The cursor must be positioned before the root `<report>` (or `<library>`)
/// tag. Semantic problems are collected on the returned design; only
/// structural problems produce an error.
pub fn deserialize_design<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    options: ParseOptions,
) -> Result<ReportDesign, DeserializeError> {
    deserialize_design_impl(cursor, ParserContext::new(options))
}

pub(crate) fn deserialize_design_impl<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    mut ctx: ParserContext,
) -> Result<ReportDesign, DeserializeError> {
    loop {
        match cursor.next_node()? {
            Node::Open { name, attrs, empty } => {
                if TagKind::from_name(&name) != TagKind::Report {
                    return Err(DeserializeError::UnexpectedElement {
                        expected: "report".to_string(),
                        found: String::from_utf8_lossy(&name).to_string(),
                    });
                }
                if let Some(raw) = attrs.get_non_blank("version") {
                    let version = raw
                        .parse()
                        .map_err(|e| DeserializeError::Custom(format!("{}", e)))?;
                    ctx.design.set_version(version);
                }
                if !empty {
                    cursor.push_path(attrs.element_name());
                    deserialize_report_content(cursor, &mut ctx)?;
                    cursor.pop_path();
                }
                break;
            }
            Node::Text(_) => {}
            Node::Close(name) => {
                return Err(cursor.error(format!(
                    "unexpected end tag </{}> before the root element",
                    String::from_utf8_lossy(&name)
                )));
            }
            Node::Eof => return Err(DeserializeError::UnexpectedEof),
        }
    }

    element::resolve_pending_extensions(&mut ctx);
    Ok(ctx.finish())
}

fn deserialize_report_content<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    ctx: &mut ParserContext,
) -> Result<(), DeserializeError> {
    loop {
        match cursor.next_node()? {
            Node::Open { name, empty, .. } => {
                let slot = match TagKind::from_name(&name) {
                    TagKind::Styles => Some(Slot::Styles),
                    TagKind::Components => Some(Slot::Components),
                    TagKind::Body => Some(Slot::Body),
                    _ => None,
                };
                match slot {
                    Some(slot) if !empty => {
                        cursor.push_path(&String::from_utf8_lossy(&name));
                        deserialize_slot(cursor, ctx, slot)?;
                        cursor.pop_path();
                    }
                    Some(_) => {}
                    None => {
                        debug!(
                            "skipping unknown tag <{}> in report",
                            String::from_utf8_lossy(&name)
                        );
                        if !empty {
                            cursor.skip_to_end(&name)?;
                        }
                    }
                }
            }
            Node::Close(_) => return Ok(()),
            Node::Text(_) => {}
            Node::Eof => return Err(DeserializeError::UnexpectedEof),
        }
    }
}

fn deserialize_slot<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    ctx: &mut ParserContext,
    slot: Slot,
) -> Result<(), DeserializeError> {
    loop {
        match cursor.next_node()? {
            Node::Open { name, attrs, empty } => match (slot, TagKind::from_name(&name)) {
                (Slot::Styles, TagKind::Element(ElementKind::Style)) => {
                    ctx.set_position(cursor.position());
                    style::deserialize_style_impl(
                        cursor,
                        ctx,
                        &attrs,
                        empty,
                        style::StyleTarget::Shared,
                    )?;
                }
                (Slot::Components | Slot::Body, TagKind::Element(kind))
                    if kind != ElementKind::Style =>
                {
                    element::deserialize_element_impl(
                        cursor,
                        ctx,
                        kind,
                        &attrs,
                        empty,
                        element::Parent::Slot(slot),
                    )?;
                }
                _ => {
                    debug!(
                        "skipping <{}> in the {:?} slot",
                        String::from_utf8_lossy(&name),
                        slot
                    );
                    if !empty {
                        cursor.skip_to_end(&name)?;
                    }
                }
            },
            Node::Close(_) => return Ok(()),
            Node::Text(_) => {}
            Node::Eof => return Err(DeserializeError::UnexpectedEof),
        }
    }
}

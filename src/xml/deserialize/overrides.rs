//! Overridden values of virtual children.
//!
//! An element that extends a template records changes to its virtual
//! children in an `<overridden-values>` block:
//!
//! ```xml
//! <table name="Orders" extends="BaseTable">
//!     <overridden-values>
//!         <ref-entry baseId="8" id="25" name="totalLabel">
//!             <property name="text">Grand total</property>
//!         </ref-entry>
//!     </overridden-values>
//! </table>
//! ```
//!
//! Each `<ref-entry>` names its target by the base id the template assigned
//! to it. When the owner's template is already applied, the entry resolves
//! to a live element and values are set immediately. When it is not, the
//! entry becomes a [`DeferredOverride`] that is replayed, in document order,
//! once the template is applied at the end of the parse.

use std::io::BufRead;

use log::debug;

use crate::core::{BaseId, ElementId};
use crate::model::{BaseIdMap, ElementHandle, PropertyValue, ReportDesign};
use crate::xml::deserialize::properties::read_property_value;
use crate::xml::deserialize::{DeserializeError, ParserContext, TagKind};
use crate::xml::errors::SemanticError;
use crate::xml::quick::{Attrs, Node, XmlCursor};

const REF_ENTRY: &str = "ref-entry";
const DEFERRED_OVERRIDE: &str = "deferred override";

/// An override recorded before its virtual child existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredOverride {
    pub base_id: BaseId,
    pub id: Option<ElementId>,
    pub name: Option<String>,
    /// Values in document order.
    pub properties: Vec<(String, PropertyValue)>,
}

impl DeferredOverride {
    fn new(base_id: BaseId, id: Option<ElementId>, name: Option<String>) -> Self {
        Self {
            base_id,
            id,
            name,
            properties: Vec::new(),
        }
    }
}

/// Raw attributes of a `<ref-entry>` tag. Blank `id` and `name` count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefEntryAttrs {
    pub base_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

impl RefEntryAttrs {
    pub fn from_attrs(attrs: &Attrs) -> Self {
        Self {
            base_id: attrs.get_opt_string("baseId"),
            id: attrs.get_non_blank("id").map(str::to_string),
            name: attrs.get_non_blank("name").map(str::to_string),
        }
    }
}

/// What a ref-entry turned into once its attributes were read.
///
/// Only `Resolved` and `Deferred` entries accept nested values; the content of
/// the other two is read and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefEntry {
    Resolved {
        base_id: BaseId,
        element: ElementHandle,
    },
    Deferred {
        base_id: BaseId,
    },
    /// Malformed base id or id.
    Invalid,
    /// The owner is extended, but not with a child of this base id.
    Orphaned {
        base_id: BaseId,
    },
}

impl RefEntry {
    pub fn accepts_values(&self) -> bool {
        matches!(self, RefEntry::Resolved { .. } | RefEntry::Deferred { .. })
    }
}

/// State of one `<overridden-values>` block.
#[derive(Debug, Clone)]
pub struct OverrideFrame {
    owner: ElementHandle,
    index: BaseIdMap,
    deferred: Vec<DeferredOverride>,
}

impl OverrideFrame {
    /// Index the virtual children `owner` has right now.
    pub fn new(design: &ReportDesign, owner: ElementHandle) -> Self {
        debug_assert!(design.element(owner).can_contain_virtual_elements());
        Self {
            owner,
            index: BaseIdMap::build(design, owner),
            deferred: Vec::new(),
        }
    }

    pub fn owner(&self) -> ElementHandle {
        self.owner
    }

    pub fn index(&self) -> &BaseIdMap {
        &self.index
    }

    pub fn deferred(&self) -> &[DeferredOverride] {
        &self.deferred
    }

    pub fn into_deferred(self) -> Vec<DeferredOverride> {
        self.deferred
    }

    /// Decide what a ref-entry refers to and apply its name and id.
    pub(crate) fn start_ref_entry(
        &mut self,
        ctx: &mut ParserContext,
        attrs: &RefEntryAttrs,
    ) -> RefEntry {
        let owner = ctx.design.identifier(self.owner);

        let raw_base_id = attrs.base_id.as_deref().unwrap_or_default();
        let Ok(base_id) = raw_base_id.parse::<BaseId>() else {
            ctx.semantic_error(
                SemanticError::InvalidElementId {
                    element: owner,
                    value: raw_base_id.to_string(),
                },
                REF_ENTRY,
            );
            return RefEntry::Invalid;
        };

        let Some(element) = self.index.get(base_id) else {
            if ctx.design.element(self.owner).extends_element().is_some() {
                ctx.semantic_warning(
                    SemanticError::VirtualParentNotFound {
                        owner,
                        base_id: raw_base_id.to_string(),
                    },
                    REF_ENTRY,
                );
                return RefEntry::Orphaned { base_id };
            }
            return self.defer(ctx, base_id, attrs, owner);
        };

        if let Some(name) = &attrs.name {
            ctx.design.element_mut(element).set_name(name.clone());
        }

        if let Some(raw_id) = attrs.id.as_deref() {
            match raw_id.parse::<ElementId>() {
                Ok(id) => ctx.assign_element_id(element, id),
                Err(err) => {
                    debug!("ref-entry {} rejected: {}", base_id, err);
                    let identifier = ctx.design.identifier(element);
                    ctx.semantic_error(
                        SemanticError::InvalidElementId {
                            element: identifier,
                            value: raw_id.to_string(),
                        },
                        REF_ENTRY,
                    );
                    return RefEntry::Invalid;
                }
            }
        }

        RefEntry::Resolved { base_id, element }
    }

    fn defer(
        &mut self,
        ctx: &mut ParserContext,
        base_id: BaseId,
        attrs: &RefEntryAttrs,
        owner: String,
    ) -> RefEntry {
        let id = match attrs.id.as_deref().map(|raw| (raw, raw.parse::<ElementId>())) {
            None => None,
            Some((_, Ok(id))) => Some(id),
            Some((raw, Err(_))) => {
                ctx.semantic_error(
                    SemanticError::InvalidElementId {
                        element: format!("{} (baseId={})", owner, base_id),
                        value: raw.to_string(),
                    },
                    REF_ENTRY,
                );
                return RefEntry::Invalid;
            }
        };

        debug!("deferring ref-entry {} under {}", base_id, owner);
        self.deferred
            .push(DeferredOverride::new(base_id, id, attrs.name.clone()));
        RefEntry::Deferred { base_id }
    }

    /// Sink for a property value addressed by base id.
    ///
    /// Applied at once when the base id resolves, otherwise queued on the
    /// most recent deferred override for that base id.
    pub(crate) fn insert_overridden_property_value(
        &mut self,
        ctx: &mut ParserContext,
        base_id: BaseId,
        name: String,
        value: PropertyValue,
    ) {
        if let Some(element) = self.index.get(base_id) {
            ctx.design.element_mut(element).set_property(name, value);
            return;
        }

        match self.deferred.iter_mut().rev().find(|d| d.base_id == base_id) {
            Some(entry) => entry.properties.push((name, value)),
            None => {
                let mut entry = DeferredOverride::new(base_id, None, None);
                entry.properties.push((name, value));
                self.deferred.push(entry);
            }
        }
    }
}

/// Read an `<overridden-values>` block owned by `owner`.
///
/// Returns the overrides that could not be resolved yet.
pub(crate) fn deserialize_overridden_values_impl<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    ctx: &mut ParserContext,
    owner: ElementHandle,
    empty: bool,
) -> Result<Vec<DeferredOverride>, DeserializeError> {
    let mut frame = OverrideFrame::new(&ctx.design, owner);
    if empty {
        return Ok(frame.into_deferred());
    }

    cursor.push_path("overridden-values");
    loop {
        match cursor.next_node()? {
            Node::Open { name, attrs, empty } => match TagKind::from_name(&name) {
                TagKind::RefEntry => {
                    ctx.set_position(cursor.position());
                    let entry = frame.start_ref_entry(ctx, &RefEntryAttrs::from_attrs(&attrs));
                    if !empty {
                        cursor.push_path(REF_ENTRY);
                        deserialize_ref_entry_content(cursor, ctx, &mut frame, entry)?;
                        cursor.pop_path();
                    }
                }
                _ => {
                    debug!(
                        "skipping <{}> in overridden-values",
                        String::from_utf8_lossy(&name)
                    );
                    if !empty {
                        cursor.skip_to_end(&name)?;
                    }
                }
            },
            Node::Close(_) => break,
            Node::Text(_) => {}
            Node::Eof => return Err(DeserializeError::UnexpectedEof),
        }
    }
    cursor.pop_path();

    Ok(frame.into_deferred())
}

/// Read the values nested in one ref-entry.
///
/// Owners that can extend accept every generic property tag; other owners
/// only accept `<property>`. Everything else is skipped.
fn deserialize_ref_entry_content<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    ctx: &mut ParserContext,
    frame: &mut OverrideFrame,
    entry: RefEntry,
) -> Result<(), DeserializeError> {
    let owner_can_extend = ctx.design.element(frame.owner()).defn().can_extend();

    loop {
        match cursor.next_node()? {
            Node::Open { name, attrs, empty } => {
                let tag = TagKind::from_name(&name);
                let recognised = if owner_can_extend {
                    tag.is_property()
                } else {
                    tag == TagKind::Property
                };
                if !entry.accepts_values() || !recognised {
                    if !empty {
                        cursor.skip_to_end(&name)?;
                    }
                    continue;
                }

                let Some((prop, value)) = read_property_value(cursor, tag, &attrs, empty)? else {
                    continue;
                };
                match entry {
                    RefEntry::Resolved { element, .. } if owner_can_extend => {
                        ctx.design.element_mut(element).set_property(prop, value);
                    }
                    RefEntry::Resolved { base_id, .. } | RefEntry::Deferred { base_id } => {
                        frame.insert_overridden_property_value(ctx, base_id, prop, value);
                    }
                    RefEntry::Invalid | RefEntry::Orphaned { .. } => {}
                }
            }
            Node::Close(_) => return Ok(()),
            Node::Text(_) => {}
            Node::Eof => return Err(DeserializeError::UnexpectedEof),
        }
    }
}

/// Apply deferred overrides now that `owner` has its virtual children.
pub(crate) fn replay_deferred(
    ctx: &mut ParserContext,
    owner: ElementHandle,
    overrides: Vec<DeferredOverride>,
) {
    if overrides.is_empty() {
        return;
    }

    let index = BaseIdMap::build(&ctx.design, owner);
    for entry in overrides {
        match index.get(entry.base_id) {
            Some(element) => apply_override(ctx, element, entry),
            None => report_orphaned(ctx, owner, entry.base_id),
        }
    }
}

/// Drop deferred overrides whose owner never got a template.
pub(crate) fn discard_deferred(
    ctx: &mut ParserContext,
    owner: ElementHandle,
    overrides: Vec<DeferredOverride>,
) {
    for entry in overrides {
        report_orphaned(ctx, owner, entry.base_id);
    }
}

fn apply_override(ctx: &mut ParserContext, element: ElementHandle, entry: DeferredOverride) {
    if let Some(name) = entry.name {
        ctx.design.element_mut(element).set_name(name);
    }
    if let Some(id) = entry.id {
        ctx.assign_element_id(element, id);
    }
    for (name, value) in entry.properties {
        ctx.design.element_mut(element).set_property(name, value);
    }
}

fn report_orphaned(ctx: &mut ParserContext, owner: ElementHandle, base_id: BaseId) {
    let owner = ctx.design.identifier(owner);
    ctx.semantic_warning(
        SemanticError::VirtualParentNotFound {
            owner,
            base_id: base_id.to_string(),
        },
        DEFERRED_OVERRIDE,
    );
}

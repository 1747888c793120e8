//! Style deserialization module.
//!
//! Handles shared styles under `<styles>` and private `<style>` blocks nested
//! in report items. Older documents store a single test expression next to
//! the highlight and map rule lists; it is copied onto every rule when the
//! block closes.

use std::io::BufRead;

use log::debug;

use crate::model::{ElementHandle, ElementKind, PropertyValue, ReportDesign, Slot, props};
use crate::xml::deserialize::properties::read_property_value;
use crate::xml::deserialize::{DeserializeError, ParserContext, TagKind};
use crate::xml::quick::{Attrs, Node, XmlCursor};

/// Where the properties of a `<style>` block end up.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StyleTarget {
    /// A named style in the `styles` slot.
    Shared,
    /// The style of the enclosing report item.
    Private(ElementHandle),
}

/// Per-block state of the style parser.
#[derive(Debug, Clone)]
pub struct StyleState {
    element: ElementHandle,
    legacy_highlight_test_expr: Option<String>,
    legacy_map_test_expr: Option<String>,
}

impl StyleState {
    pub fn new(element: ElementHandle) -> Self {
        Self {
            element,
            legacy_highlight_test_expr: None,
            legacy_map_test_expr: None,
        }
    }

    /// The element receiving this block's properties.
    pub fn element(&self) -> ElementHandle {
        self.element
    }

    /// Set a property read inside the block. Legacy test expressions are
    /// held back until [`StyleState::end`].
    pub fn set_property(&mut self, design: &mut ReportDesign, name: String, value: PropertyValue) {
        let slot = match name.as_str() {
            props::LEGACY_HIGHLIGHT_TEST_EXPR => &mut self.legacy_highlight_test_expr,
            props::LEGACY_MAP_TEST_EXPR => &mut self.legacy_map_test_expr,
            _ => {
                design.element_mut(self.element).set_property(name, value);
                return;
            }
        };
        match value {
            PropertyValue::Simple(text) | PropertyValue::Expression(text) => *slot = Some(text),
            PropertyValue::List(_) => debug!("ignoring list value for legacy property {}", name),
        }
    }

    pub fn legacy_highlight_test_expr(&self) -> Option<&str> {
        self.legacy_highlight_test_expr.as_deref()
    }

    pub fn legacy_map_test_expr(&self) -> Option<&str> {
        self.legacy_map_test_expr.as_deref()
    }

    /// Close the block: move legacy test expressions onto their rules.
    pub fn end(&mut self, design: &mut ReportDesign) {
        let element = self.element;
        for (list, slot) in [
            (props::HIGHLIGHT_RULES, &mut self.legacy_highlight_test_expr),
            (props::MAP_RULES, &mut self.legacy_map_test_expr),
        ] {
            let Some(expr) = slot.take().filter(|e| !e.is_empty()) else {
                continue;
            };
            match design.element_mut(element).list_property_mut(list) {
                Some(rules) => {
                    for rule in rules.iter_mut() {
                        rule.set_test_expression(expr.as_str());
                    }
                }
                None => debug!("legacy test expression without {}; dropped", list),
            }
        }
    }
}

/// Read a `<style>` block whose start tag has already been consumed.
pub(crate) fn deserialize_style_impl<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    ctx: &mut ParserContext,
    attrs: &Attrs,
    empty: bool,
    target: StyleTarget,
) -> Result<ElementHandle, DeserializeError> {
    let element = match target {
        StyleTarget::Shared => {
            let handle = ctx.design.create_element(ElementKind::Style);
            ctx.design.add_to_slot(Slot::Styles, handle);
            if let Some(name) = attrs.get_non_blank("name") {
                ctx.design.element_mut(handle).set_name(name);
            }
            if let Some(raw) = attrs.get_opt("id") {
                ctx.read_element_id(handle, raw);
            }
            handle
        }
        StyleTarget::Private(owner) => owner,
    };

    let mut state = StyleState::new(element);
    if !empty {
        cursor.push_path("style");
        loop {
            match cursor.next_node()? {
                Node::Open { name, attrs, empty } => match TagKind::from_name(&name) {
                    tag if tag.is_property() => {
                        if let Some((prop, value)) = read_property_value(cursor, tag, &attrs, empty)? {
                            state.set_property(&mut ctx.design, prop, value);
                        }
                    }
                    _ => {
                        debug!("skipping <{}> in style", String::from_utf8_lossy(&name));
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
    }
    state.end(&mut ctx.design);

    Ok(element)
}

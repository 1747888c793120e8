//! Report item deserialization and template resolution.

use std::collections::HashSet;
use std::io::BufRead;

use log::debug;

use crate::model::{ElementHandle, ElementKind, ReportDesign, Slot, extend_element};
use crate::xml::deserialize::overrides::{self, DeferredOverride};
use crate::xml::deserialize::properties::read_property_value;
use crate::xml::deserialize::style::{self, StyleTarget};
use crate::xml::deserialize::{
    DeserializeError, ParserContext, PendingExtension, TagKind,
};
use crate::xml::errors::SemanticError;
use crate::xml::quick::{Attrs, Node, XmlCursor};

/// Where a newly read element is attached.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Parent {
    Slot(Slot),
    Element(ElementHandle),
}

/// Read one report item and everything nested in it.
///
/// The start tag has already been consumed; `attrs` and `empty` describe it.
pub(crate) fn deserialize_element_impl<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    ctx: &mut ParserContext,
    kind: ElementKind,
    attrs: &Attrs,
    empty: bool,
    parent: Parent,
) -> Result<ElementHandle, DeserializeError> {
    ctx.set_position(cursor.position());
    let handle = ctx.design.create_element(kind);
    match parent {
        Parent::Slot(slot) => ctx.design.add_to_slot(slot, handle),
        Parent::Element(container) => ctx.design.add_child(container, handle),
    }

    if let Some(name) = attrs.get_non_blank("name") {
        ctx.design.element_mut(handle).set_name(name);
    }
    if let Some(raw) = attrs.get_opt("id") {
        ctx.read_element_id(handle, raw);
    }

    let mut reference = attrs.get_non_blank("extends").map(str::to_string);
    if reference.is_some() && !kind.defn().can_extend() {
        debug!(
            "ignoring extends on {}, which cannot extend",
            ctx.design.identifier(handle)
        );
        reference = None;
    }
    if let Some(reference) = &reference {
        ctx.design.element_mut(handle).extends_ref = Some(reference.clone());
        match find_extends_template(ctx, handle, reference) {
            Some(template) if !is_pending_subtree(ctx, template) => {
                extend_element(&mut ctx.design, handle, template);
            }
            _ => debug!(
                "{} extends '{}', which is not available yet",
                ctx.design.identifier(handle),
                reference
            ),
        }
    }

    let mut deferred: Vec<DeferredOverride> = Vec::new();
    if !empty {
        cursor.push_path(kind.tag());
        loop {
            match cursor.next_node()? {
                Node::Open { name, attrs, empty } => match TagKind::from_name(&name) {
                    tag if tag.is_property() => {
                        if let Some((prop, value)) = read_property_value(cursor, tag, &attrs, empty)? {
                            ctx.design.element_mut(handle).set_property(prop, value);
                        }
                    }
                    TagKind::Element(ElementKind::Style) if kind.defn().has_style() => {
                        style::deserialize_style_impl(
                            cursor,
                            ctx,
                            &attrs,
                            empty,
                            StyleTarget::Private(handle),
                        )?;
                    }
                    TagKind::Element(child) if child != ElementKind::Style => {
                        deserialize_element_impl(
                            cursor,
                            ctx,
                            child,
                            &attrs,
                            empty,
                            Parent::Element(handle),
                        )?;
                    }
                    TagKind::OverriddenValues if kind.defn().can_contain_virtual_elements() => {
                        deferred.extend(overrides::deserialize_overridden_values_impl(
                            cursor, ctx, handle, empty,
                        )?);
                    }
                    _ => {
                        debug!(
                            "skipping <{}> under {}",
                            String::from_utf8_lossy(&name),
                            ctx.design.identifier(handle)
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
    }

    let unresolved = ctx.design.element(handle).extends_element().is_none();
    if unresolved && (reference.is_some() || !deferred.is_empty()) {
        ctx.defer_extension(PendingExtension {
            owner: handle,
            reference,
            overrides: deferred,
        });
    }

    Ok(handle)
}

/// The template `owner` may extend, if the reference names a usable one.
///
/// Only kinds that can extend have templates. A template must be a component
/// of the same kind and must not contain the owner or be contained by it.
fn find_extends_template(
    ctx: &ParserContext,
    owner: ElementHandle,
    reference: &str,
) -> Option<ElementHandle> {
    let kind = ctx.design.element(owner).kind();
    if !kind.defn().can_extend() {
        return None;
    }
    ctx.design.find_template(reference, kind).filter(|template| {
        *template != owner
            && !ctx.design.is_ancestor(*template, owner)
            && !ctx.design.is_ancestor(owner, *template)
    })
}

/// Whether `template` or anything nested in it still waits for its own
/// template. Copying such a structure would miss virtual children.
fn is_pending_subtree(ctx: &ParserContext, template: ElementHandle) -> bool {
    waits_in_subtree(&ctx.design, template, |h| ctx.is_pending(h))
}

fn waits_in_subtree(
    design: &ReportDesign,
    root: ElementHandle,
    waiting: impl Fn(ElementHandle) -> bool,
) -> bool {
    let mut stack = vec![root];
    while let Some(handle) = stack.pop() {
        if waiting(handle) {
            return true;
        }
        stack.extend_from_slice(design.element(handle).children());
    }
    false
}

/// Apply every extension that could not be applied while reading.
///
/// A pending element is resolved only once its template is itself resolved,
/// so chains of forward references settle in dependency order. Whatever is
/// left afterwards refers to a missing template or forms a cycle.
pub(crate) fn resolve_pending_extensions(ctx: &mut ParserContext) {
    let mut pending = ctx.take_pending();
    ctx.clear_position();

    loop {
        let waiting: HashSet<ElementHandle> = pending.iter().map(|p| p.owner).collect();
        let ready = pending.iter().position(|p| {
            match p
                .reference
                .as_deref()
                .and_then(|r| find_extends_template(ctx, p.owner, r))
            {
                Some(template) => {
                    !waits_in_subtree(&ctx.design, template, |h| waiting.contains(&h))
                }
                None => true,
            }
        });
        let Some(idx) = ready else {
            break;
        };
        let next = pending.remove(idx);
        complete_extension(ctx, next);
    }

    for unresolved in pending {
        fail_extension(ctx, unresolved);
    }
}

fn complete_extension(ctx: &mut ParserContext, pending: PendingExtension) {
    let template = pending
        .reference
        .as_deref()
        .and_then(|r| find_extends_template(ctx, pending.owner, r));
    match template {
        Some(template) => {
            debug!(
                "resolved forward extends of {}",
                ctx.design.identifier(pending.owner)
            );
            extend_element(&mut ctx.design, pending.owner, template);
            overrides::replay_deferred(ctx, pending.owner, pending.overrides);
        }
        None => fail_extension(ctx, pending),
    }
}

fn fail_extension(ctx: &mut ParserContext, pending: PendingExtension) {
    if let Some(reference) = pending.reference {
        let element = ctx.design.identifier(pending.owner);
        ctx.semantic_warning(
            SemanticError::UnresolvedExtends { element, reference },
            "extends",
        );
    }
    overrides::discard_deferred(ctx, pending.owner, pending.overrides);
}

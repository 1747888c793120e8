use std::collections::HashMap;

use crate::core::{DesignVersion, ElementId};
use crate::model::defn::ElementKind;
use crate::model::element::{Element, ElementHandle, PropertyValue};
use crate::xml::errors::{Diagnostic, Severity};

/// Top-level slots of a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Shared styles.
    Styles,
    /// Templates other elements may extend.
    Components,
    /// The report content.
    Body,
}

/// An in-memory report design.
///
/// Elements live in an arena and refer to one another through
/// [`ElementHandle`]s. The design also owns the document-wide id registry and
/// the semantic diagnostics raised while it was read.
#[derive(Debug, Clone, Default)]
pub struct ReportDesign {
    version: DesignVersion,
    elements: Vec<Element>,
    styles: Vec<ElementHandle>,
    components: Vec<ElementHandle>,
    body: Vec<ElementHandle>,
    id_map: HashMap<ElementId, ElementHandle>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl ReportDesign {
    pub fn new(version: DesignVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn version(&self) -> DesignVersion {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: DesignVersion) {
        self.version = version;
    }

    /// Create a detached element. Attach it with [`add_to_slot`](Self::add_to_slot)
    /// or [`add_child`](Self::add_child).
    pub fn create_element(&mut self, kind: ElementKind) -> ElementHandle {
        self.elements.push(Element::new(kind));
        ElementHandle(self.elements.len() - 1)
    }

    /// # Panics
    ///
    /// Panics if the handle does not belong to this design.
    pub fn element(&self, handle: ElementHandle) -> &Element {
        &self.elements[handle.0]
    }

    /// # Panics
    ///
    /// Panics if the handle does not belong to this design.
    pub fn element_mut(&mut self, handle: ElementHandle) -> &mut Element {
        &mut self.elements[handle.0]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn add_to_slot(&mut self, slot: Slot, element: ElementHandle) {
        match slot {
            Slot::Styles => self.styles.push(element),
            Slot::Components => self.components.push(element),
            Slot::Body => self.body.push(element),
        }
    }

    pub fn slot(&self, slot: Slot) -> &[ElementHandle] {
        match slot {
            Slot::Styles => &self.styles,
            Slot::Components => &self.components,
            Slot::Body => &self.body,
        }
    }

    pub fn add_child(&mut self, container: ElementHandle, child: ElementHandle) {
        self.elements[child.0].container = Some(container);
        self.elements[container.0].children.push(child);
    }

    pub fn get_element_by_id(&self, id: ElementId) -> Option<ElementHandle> {
        self.id_map.get(&id).copied()
    }

    /// Assign an id and register it. The registry always points at the
    /// element that most recently claimed an id.
    pub fn set_element_id(&mut self, handle: ElementHandle, id: ElementId) {
        let previous = self.elements[handle.0].id.replace(id);
        if let Some(old) = previous.filter(|old| *old != id) {
            if self.id_map.get(&old) == Some(&handle) {
                self.id_map.remove(&old);
            }
        }
        self.id_map.insert(id, handle);
    }

    /// Human-readable reference to an element, used in diagnostics.
    pub fn identifier(&self, handle: ElementHandle) -> String {
        let element = self.element(handle);
        let tag = element.kind().tag();
        match (element.name(), element.id()) {
            (Some(name), _) => format!("{}(\"{}\")", tag, name),
            (None, Some(id)) => format!("{}(id={})", tag, id),
            (None, None) => match element.base_id() {
                Some(base_id) => format!("{}(baseId={})", tag, base_id),
                None => tag.to_string(),
            },
        }
    }

    /// Find the template named `name` of the given kind.
    pub fn find_template(&self, name: &str, kind: ElementKind) -> Option<ElementHandle> {
        self.components.iter().copied().find(|h| {
            let element = self.element(*h);
            element.kind() == kind && element.name() == Some(name)
        })
    }

    pub fn find_style(&self, name: &str) -> Option<ElementHandle> {
        self.styles
            .iter()
            .copied()
            .find(|h| self.element(*h).name() == Some(name))
    }

    /// Whether `ancestor` appears on the container chain of `element`.
    pub fn is_ancestor(&self, ancestor: ElementHandle, element: ElementHandle) -> bool {
        let mut current = self.element(element).container();
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.element(handle).container();
        }
        false
    }

    /// Property lookup falling back along the extends chain.
    pub fn property(&self, handle: ElementHandle, name: &str) -> Option<&PropertyValue> {
        let mut current = Some(handle);
        // A chain can never be longer than the number of elements.
        for _ in 0..=self.elements.len() {
            let element = self.element(current?);
            if let Some(value) = element.local_property(name) {
                return Some(value);
            }
            current = element.extends_element();
        }
        None
    }

    /// Every semantic diagnostic raised while reading this design.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u64) -> ElementId {
        ElementId::new(value).unwrap()
    }

    #[test]
    fn test_id_registry_rekeys_on_change() {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let label = design.create_element(ElementKind::Label);

        design.set_element_id(label, id(3));
        assert_eq!(design.get_element_by_id(id(3)), Some(label));

        design.set_element_id(label, id(4));
        assert_eq!(design.get_element_by_id(id(3)), None);
        assert_eq!(design.get_element_by_id(id(4)), Some(label));
        assert_eq!(design.element(label).id(), Some(id(4)));
    }

    #[test]
    fn test_id_registry_latest_owner_wins() {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let first = design.create_element(ElementKind::Label);
        let second = design.create_element(ElementKind::Label);

        design.set_element_id(first, id(9));
        design.set_element_id(second, id(9));
        assert_eq!(design.get_element_by_id(id(9)), Some(second));

        // Moving the first element off the shared id keeps the second registered.
        design.set_element_id(first, id(10));
        assert_eq!(design.get_element_by_id(id(9)), Some(second));
    }

    #[test]
    fn test_identifier_formats() {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let table = design.create_element(ElementKind::Table);
        assert_eq!(design.identifier(table), "table");

        design.set_element_id(table, id(12));
        assert_eq!(design.identifier(table), "table(id=12)");

        design.element_mut(table).set_name("Orders");
        assert_eq!(design.identifier(table), "table(\"Orders\")");
    }

    #[test]
    fn test_find_template_matches_kind() {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let table = design.create_element(ElementKind::Table);
        design.element_mut(table).set_name("Base");
        design.add_to_slot(Slot::Components, table);

        assert_eq!(design.find_template("Base", ElementKind::Table), Some(table));
        assert_eq!(design.find_template("Base", ElementKind::Grid), None);
        assert_eq!(design.find_template("Other", ElementKind::Table), None);
    }

    #[test]
    fn test_property_falls_back_to_template() {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let template = design.create_element(ElementKind::Label);
        let derived = design.create_element(ElementKind::Label);
        design.element_mut(template).set_property("text", "base");
        design.element_mut(template).set_property("color", "red");
        design.element_mut(derived).extends = Some(template);
        design.element_mut(derived).set_property("text", "local");

        assert_eq!(
            design.property(derived, "text").and_then(PropertyValue::as_str),
            Some("local")
        );
        assert_eq!(
            design.property(derived, "color").and_then(PropertyValue::as_str),
            Some("red")
        );
        assert!(design.property(derived, "missing").is_none());
    }

    #[test]
    fn test_is_ancestor() {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let table = design.create_element(ElementKind::Table);
        let row = design.create_element(ElementKind::Row);
        let cell = design.create_element(ElementKind::Cell);
        design.add_child(table, row);
        design.add_child(row, cell);

        assert!(design.is_ancestor(table, cell));
        assert!(!design.is_ancestor(cell, table));
        assert!(!design.is_ancestor(cell, cell));
    }
}

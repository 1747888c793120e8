//! Structural operations on extended elements.
//!
//! An element that extends a template receives a copy of the template's
//! structure. Each copied element is *virtual*: it carries the base id of the
//! template element it came from, which is how overridden values in the
//! document find it again.

use std::collections::HashMap;

use log::debug;

use crate::core::BaseId;
use crate::model::design::ReportDesign;
use crate::model::element::ElementHandle;

/// Mapping from base id to the live virtual child under one owning element.
///
/// Built once per owner from its current structure and never updated; a
/// fresh map must be built after the structure changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseIdMap {
    map: HashMap<BaseId, ElementHandle>,
}

impl BaseIdMap {
    /// Walk every descendant of `owner` and index the virtual ones.
    ///
    /// An owner without structural children yields an empty map.
    pub fn build(design: &ReportDesign, owner: ElementHandle) -> Self {
        let mut map = HashMap::new();
        let mut stack: Vec<ElementHandle> =
            design.element(owner).children().iter().rev().copied().collect();

        while let Some(handle) = stack.pop() {
            let element = design.element(handle);
            if let Some(base_id) = element.base_id() {
                if let Some(first) = map.get(&base_id) {
                    debug!(
                        "base id {} appears twice under {}; keeping {}",
                        base_id,
                        design.identifier(owner),
                        design.identifier(*first)
                    );
                } else {
                    map.insert(base_id, handle);
                }
            }
            stack.extend(element.children().iter().rev().copied());
        }

        Self { map }
    }

    pub fn get(&self, base_id: BaseId) -> Option<ElementHandle> {
        self.map.get(&base_id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Link `owner` to `template` and give it a virtual copy of the template's
/// structure.
pub fn extend_element(design: &mut ReportDesign, owner: ElementHandle, template: ElementHandle) {
    design.element_mut(owner).extends = Some(template);
    duplicate_structure(design, template, owner);
}

/// Copy every descendant of `source` under `target` as virtual elements.
///
/// A copy's base id is the source element's own base id when the source is
/// itself virtual, otherwise the source's element id. Source elements with
/// neither are copied without a base id and cannot be overridden.
pub fn duplicate_structure(design: &mut ReportDesign, source: ElementHandle, target: ElementHandle) {
    let children = design.element(source).children().to_vec();
    for child in children {
        let template_child = design.element(child).clone();
        let base_id = template_child
            .base_id()
            .or_else(|| template_child.id().map(BaseId::from));

        let copy = design.create_element(template_child.kind());
        let virtual_child = design.element_mut(copy);
        virtual_child.base_id = base_id;
        virtual_child.copy_properties_from(&template_child);
        design.add_child(target, copy);

        duplicate_structure(design, child, copy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DesignVersion, ElementId};
    use crate::model::defn::ElementKind;
    use crate::model::element::PropertyValue;

    /// table(id=1) > row(id=2) > cell(id=3) > label(id=4)
    fn template_design() -> (ReportDesign, ElementHandle) {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let table = design.create_element(ElementKind::Table);
        let row = design.create_element(ElementKind::Row);
        let cell = design.create_element(ElementKind::Cell);
        let label = design.create_element(ElementKind::Label);
        for (value, handle) in [(1, table), (2, row), (3, cell), (4, label)] {
            design.set_element_id(handle, ElementId::new(value).unwrap());
        }
        design.add_child(table, row);
        design.add_child(row, cell);
        design.add_child(cell, label);
        design.element_mut(label).set_property("text", "Total");
        (design, table)
    }

    #[test]
    fn test_empty_owner_yields_empty_map() {
        let mut design = ReportDesign::new(DesignVersion::CURRENT);
        let table = design.create_element(ElementKind::Table);
        let map = BaseIdMap::build(&design, table);
        assert!(map.is_empty());
    }

    #[test]
    fn test_extend_element_indexes_every_virtual_child() {
        let (mut design, template) = template_design();
        let owner = design.create_element(ElementKind::Table);
        extend_element(&mut design, owner, template);

        assert_eq!(design.element(owner).extends_element(), Some(template));
        let map = BaseIdMap::build(&design, owner);
        assert_eq!(map.len(), 3);

        let label = map.get(BaseId::new(4)).unwrap();
        let element = design.element(label);
        assert_eq!(element.kind(), ElementKind::Label);
        assert!(element.is_virtual());
        assert_eq!(element.id(), None);
        assert_eq!(
            element.local_property("text"),
            Some(&PropertyValue::Simple("Total".to_string()))
        );
        assert!(map.get(BaseId::new(1)).is_none());
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let (mut design, template) = template_design();
        let owner = design.create_element(ElementKind::Table);
        extend_element(&mut design, owner, template);

        let map = BaseIdMap::build(&design, owner);
        assert_eq!(map.get(BaseId::new(3)), map.get(BaseId::new(3)));
        assert_eq!(map, BaseIdMap::build(&design, owner));
    }

    #[test]
    fn test_nested_templates_keep_original_base_ids() {
        let (mut design, template) = template_design();
        let middle = design.create_element(ElementKind::Table);
        extend_element(&mut design, middle, template);
        let owner = design.create_element(ElementKind::Table);
        extend_element(&mut design, owner, middle);

        let map = BaseIdMap::build(&design, owner);
        let keys: Vec<_> = [2, 3, 4]
            .into_iter()
            .filter(|v| map.get(BaseId::new(*v)).is_some())
            .collect();
        assert_eq!(keys, vec![2, 3, 4]);
    }
}

use std::collections::{BTreeMap, HashMap};

use crate::core::{BaseId, ElementId};
use crate::model::defn::{ElementDefn, ElementKind, props};

/// Index of an element inside its [`ReportDesign`](crate::model::ReportDesign).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub(crate) usize);

/// A property value as read from the document.
///
/// Values are kept in their raw string form; coercion to typed values is
/// left to consumers of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Simple(String),
    Expression(String),
    List(Vec<Structure>),
}

impl PropertyValue {
    /// The raw text of a simple or expression value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Simple(s) | PropertyValue::Expression(s) => Some(s),
            PropertyValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Structure]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Simple(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Simple(value)
    }
}

/// One entry of a list-valued property, such as a highlight rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Structure {
    members: BTreeMap<String, String>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, name: &str, value: &str) -> Self {
        self.set_member(name, value);
        self
    }

    pub fn member(&self, name: &str) -> Option<&str> {
        self.members.get(name).map(|s| s.as_str())
    }

    pub fn set_member(&mut self, name: &str, value: impl Into<String>) {
        self.members.insert(name.to_string(), value.into());
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn test_expression(&self) -> Option<&str> {
        self.member(props::TEST_EXPR_MEMBER)
    }

    pub fn set_test_expression(&mut self, expr: impl Into<String>) {
        self.set_member(props::TEST_EXPR_MEMBER, expr);
    }
}

/// A node of the design tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    pub(crate) id: Option<ElementId>,
    name: Option<String>,
    /// Set on virtual children only.
    pub(crate) base_id: Option<BaseId>,
    pub(crate) extends: Option<ElementHandle>,
    pub(crate) extends_ref: Option<String>,
    pub(crate) container: Option<ElementHandle>,
    pub(crate) children: Vec<ElementHandle>,
    properties: HashMap<String, PropertyValue>,
}

impl Element {
    pub(crate) fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            id: None,
            name: None,
            base_id: None,
            extends: None,
            extends_ref: None,
            container: None,
            children: Vec::new(),
            properties: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn defn(&self) -> &'static ElementDefn {
        self.kind.defn()
    }

    pub fn id(&self) -> Option<ElementId> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn base_id(&self) -> Option<BaseId> {
        self.base_id
    }

    pub fn is_virtual(&self) -> bool {
        self.base_id.is_some()
    }

    pub fn extends_element(&self) -> Option<ElementHandle> {
        self.extends
    }

    /// The template name given in the `extends` attribute, resolved or not.
    pub fn extends_ref(&self) -> Option<&str> {
        self.extends_ref.as_deref()
    }

    pub fn can_contain_virtual_elements(&self) -> bool {
        self.defn().can_contain_virtual_elements()
    }

    pub fn container(&self) -> Option<ElementHandle> {
        self.container
    }

    pub fn children(&self) -> &[ElementHandle] {
        &self.children
    }

    /// The locally set value of a property.
    pub fn local_property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn list_property(&self, name: &str) -> Option<&[Structure]> {
        self.properties.get(name).and_then(PropertyValue::as_list)
    }

    pub fn list_property_mut(&mut self, name: &str) -> Option<&mut Vec<Structure>> {
        match self.properties.get_mut(name) {
            Some(PropertyValue::List(items)) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn copy_properties_from(&mut self, other: &Element) {
        self.properties = other.properties.clone();
    }
}

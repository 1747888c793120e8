//! Static element definitions.
//!
//! Every element kind that can appear in a design has one [`ElementDefn`]
//! describing the capabilities the parser needs to know about: whether the
//! kind may extend a template, whether it can host virtual children, and
//! whether it accepts a private style block.

/// Property names with special meaning to the parser.
pub mod props {
    /// List of highlight rule structures on a style.
    pub const HIGHLIGHT_RULES: &str = "highlightRules";
    /// List of map rule structures on a style.
    pub const MAP_RULES: &str = "mapRules";
    /// Old single-value encoding of the highlight rule test expression.
    pub const LEGACY_HIGHLIGHT_TEST_EXPR: &str = "highlightTestExpr";
    /// Old single-value encoding of the map rule test expression.
    pub const LEGACY_MAP_TEST_EXPR: &str = "mapTestExpr";
    /// Structure member holding a rule's own test expression.
    pub const TEST_EXPR_MEMBER: &str = "testExpr";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Style,
    Table,
    Grid,
    List,
    ExtendedItem,
    Row,
    Cell,
    Label,
    Text,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementDefn {
    pub kind: ElementKind,
    pub tag: &'static str,
    can_extend: bool,
    can_contain_virtual_elements: bool,
    has_style: bool,
}

impl ElementDefn {
    const fn new(
        kind: ElementKind,
        tag: &'static str,
        can_extend: bool,
        can_contain_virtual_elements: bool,
        has_style: bool,
    ) -> Self {
        Self {
            kind,
            tag,
            can_extend,
            can_contain_virtual_elements,
            has_style,
        }
    }

    /// Whether elements of this kind may derive from a template and accept
    /// arbitrary property overrides on their virtual children.
    pub fn can_extend(&self) -> bool {
        self.can_extend
    }

    pub fn can_contain_virtual_elements(&self) -> bool {
        self.can_contain_virtual_elements
    }

    pub fn has_style(&self) -> bool {
        self.has_style
    }
}

static DEFINITIONS: [ElementDefn; 10] = [
    ElementDefn::new(ElementKind::Style, "style", false, false, false),
    ElementDefn::new(ElementKind::Table, "table", true, true, true),
    ElementDefn::new(ElementKind::Grid, "grid", true, true, true),
    ElementDefn::new(ElementKind::List, "list", true, true, true),
    ElementDefn::new(ElementKind::ExtendedItem, "extended-item", false, true, true),
    ElementDefn::new(ElementKind::Row, "row", false, false, true),
    ElementDefn::new(ElementKind::Cell, "cell", false, false, true),
    ElementDefn::new(ElementKind::Label, "label", true, false, true),
    ElementDefn::new(ElementKind::Text, "text", true, false, true),
    ElementDefn::new(ElementKind::Data, "data", true, false, true),
];

impl ElementKind {
    pub fn defn(self) -> &'static ElementDefn {
        // DEFINITIONS is declared in variant order.
        &DEFINITIONS[self as usize]
    }

    pub fn tag(self) -> &'static str {
        self.defn().tag
    }

    /// Look up a kind by tag name, ignoring ASCII case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        DEFINITIONS
            .iter()
            .find(|defn| defn.tag.eq_ignore_ascii_case(tag))
            .map(|defn| defn.kind)
    }
}

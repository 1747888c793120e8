//! Generic property deserialization.
//!
//! Handles `<property>`, `<expression>` and `<list-property>` tags. The
//! reader only produces `(name, value)` pairs; where a value ends up (a live
//! element, a style's transitional slot, a deferred override) is up to the
//! caller.

use std::io::BufRead;

use log::debug;

use crate::model::{PropertyValue, Structure};
use crate::xml::deserialize::{DeserializeError, TagKind};
use crate::xml::quick::{Attrs, Node, XmlCursor};

/// Read one property tag whose start tag has already been consumed.
///
/// Returns `None` for tags without a `name` attribute; their content is
/// still consumed so the cursor ends up after the matching end tag.
pub fn read_property_value<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    tag: TagKind,
    attrs: &Attrs,
    empty: bool,
) -> Result<Option<(String, PropertyValue)>, DeserializeError> {
    let value = match tag {
        TagKind::Property => PropertyValue::Simple(read_text_or_empty(cursor, empty)?),
        TagKind::Expression => PropertyValue::Expression(read_text_or_empty(cursor, empty)?),
        TagKind::ListProperty => PropertyValue::List(read_structures(cursor, empty)?),
        _ => {
            return Err(cursor.error(format!(
                "<{}> is not a property tag",
                attrs.element_name()
            )));
        }
    };

    match attrs.get_non_blank("name") {
        Some(name) => Ok(Some((name.to_string(), value))),
        None => {
            debug!("ignoring <{}> without a name", attrs.element_name());
            Ok(None)
        }
    }
}

fn read_text_or_empty<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    empty: bool,
) -> Result<String, DeserializeError> {
    if empty {
        Ok(String::new())
    } else {
        cursor.read_text()
    }
}

fn read_structures<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    empty: bool,
) -> Result<Vec<Structure>, DeserializeError> {
    let mut items = Vec::new();
    if empty {
        return Ok(items);
    }

    loop {
        match cursor.next_node()? {
            Node::Open { name, empty, .. } if TagKind::from_name(&name) == TagKind::Structure => {
                items.push(read_structure(cursor, empty)?);
            }
            Node::Open { name, empty, .. } => {
                debug!(
                    "skipping <{}> in list-property",
                    String::from_utf8_lossy(&name)
                );
                if !empty {
                    cursor.skip_to_end(&name)?;
                }
            }
            Node::Close(_) => break,
            Node::Text(_) => {}
            Node::Eof => return Err(DeserializeError::UnexpectedEof),
        }
    }

    Ok(items)
}

fn read_structure<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    empty: bool,
) -> Result<Structure, DeserializeError> {
    let mut structure = Structure::new();
    if empty {
        return Ok(structure);
    }

    loop {
        match cursor.next_node()? {
            Node::Open { name, attrs, empty } => match TagKind::from_name(&name) {
                TagKind::Property | TagKind::Expression => {
                    let text = read_text_or_empty(cursor, empty)?;
                    if let Some(member) = attrs.get_non_blank("name") {
                        structure.set_member(member, text);
                    }
                }
                _ => {
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

    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_first(xml: &str) -> Option<(String, PropertyValue)> {
        let mut cursor = XmlCursor::from_str(xml.trim());
        match cursor.next_node().unwrap() {
            Node::Open { name, attrs, empty } => {
                read_property_value(&mut cursor, TagKind::from_name(&name), &attrs, empty).unwrap()
            }
            other => panic!("Expected a start tag, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_and_expression_values() {
        assert_eq!(
            read_first(r#"<property name="color">red</property>"#),
            Some(("color".to_string(), PropertyValue::Simple("red".to_string())))
        );
        assert_eq!(
            read_first(r#"<expression name="valueExpr">row["x"] * 2</expression>"#),
            Some((
                "valueExpr".to_string(),
                PropertyValue::Expression("row[\"x\"] * 2".to_string())
            ))
        );
        assert_eq!(
            read_first(r#"<property name="text"/>"#),
            Some(("text".to_string(), PropertyValue::Simple(String::new())))
        );
    }

    #[test]
    fn test_nameless_property_is_consumed() {
        let mut cursor = XmlCursor::from_str(r#"<r><property>lost</property><tail/></r>"#);
        cursor.next_node().unwrap();
        let Node::Open { name, attrs, empty } = cursor.next_node().unwrap() else {
            panic!("Expected <property>");
        };
        let value =
            read_property_value(&mut cursor, TagKind::from_name(&name), &attrs, empty).unwrap();
        assert!(value.is_none());
        assert!(matches!(
            cursor.next_node().unwrap(),
            Node::Open { name, .. } if name == b"tail"
        ));
    }

    #[test]
    fn test_property_text_is_kept_verbatim() {
        assert_eq!(
            read_first("<property name=\"text\">  a  </property>"),
            Some(("text".to_string(), PropertyValue::Simple("  a  ".to_string())))
        );
        assert_eq!(
            read_first("<expression name=\"valueExpr\">a <!--c--> b</expression>"),
            Some(("valueExpr".to_string(), PropertyValue::Expression("a  b".to_string())))
        );
    }

    #[test]
    fn test_list_property_structures() {
        let xml = r#"
            <list-property name="highlightRules">
                <structure>
                    <property name="operator">eq</property>
                    <expression name="value1">1</expression>
                    <unknown><property name="x">y</property></unknown>
                </structure>
                <structure/>
                <junk>ignored</junk>
            </list-property>"#;
        let (name, value) = read_first(xml).unwrap();
        assert_eq!(name, "highlightRules");

        let rules = value.as_list().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules[0],
            Structure::new()
                .with_member("operator", "eq")
                .with_member("value1", "1")
        );
        assert_eq!(rules[1], Structure::new());
    }
}

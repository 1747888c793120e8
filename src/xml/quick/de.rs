//! Deserialization helpers for quick-xml.
//!
//! Provides:
//! - `Attrs`: typed attribute map with convenient getters
//! - `XmlCursor`: owning wrapper that yields owned [`Node`]s and tracks the tag path
//! - `skip_element`: robust subtree skipping for unknown elements

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::xml::deserialize::DeserializeError;

/// A parsed attribute map that owns decoded string values.
///
/// Use this instead of repeatedly iterating over `BytesStart::attributes()`
/// and calling `decode_and_unescape_value` for each attribute.
#[derive(Debug, Clone, Default)]
pub struct Attrs {
    map: HashMap<String, String>,
    /// The element name for error messages
    element_name: String,
}

impl Attrs {
    /// Parse attributes from a `BytesStart` event.
    ///
    /// This decodes and unescapes all attribute values once, storing them in a HashMap.
    pub fn from_start<R: BufRead>(
        start: &BytesStart<'_>,
        reader: &Reader<R>,
    ) -> Result<Self, DeserializeError> {
        let element_name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut map = HashMap::new();

        for attr_result in start.attributes() {
            let attr = attr_result?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.decode_and_unescape_value(reader)?.to_string();
            map.insert(key, value);
        }

        Ok(Self { map, element_name })
    }

    /// Get the element name this Attrs was parsed from.
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Get an optional string attribute.
    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    /// Get an optional attribute, treating blank values as absent.
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get_opt(key).filter(|s| !s.trim().is_empty())
    }

    /// Get a required string attribute, returning an error if missing.
    pub fn get_req(&self, key: &str) -> Result<&str, DeserializeError> {
        self.map
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| DeserializeError::MissingField(format!("{}@{}", self.element_name, key)))
    }

    /// Get an optional string attribute as an owned String.
    pub fn get_opt_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }
}

/// One owned step through the document.
#[derive(Debug, Clone)]
pub enum Node {
    /// A start tag. `empty` is true for `<tag/>`, which has no matching close.
    Open {
        name: Vec<u8>,
        attrs: Attrs,
        empty: bool,
    },
    Close(Vec<u8>),
    Text(String),
    Eof,
}

/// Skip an entire element subtree, consuming all nested content until the matching end tag.
///
/// Call this when you've just consumed a `Start` event and want to skip everything
/// inside it (including nested elements) until the corresponding `End` event.
pub fn skip_element<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    tag_name: &[u8],
) -> Result<(), DeserializeError> {
    let mut depth = 1u32;

    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == tag_name {
                    break;
                }
            }
            Event::Eof => {
                return Err(DeserializeError::UnexpectedEof);
            }
            // Text, CData, Comment, PI, Empty, Decl - just consume and continue
            _ => {}
        }
    }

    Ok(())
}

/// A wrapper around quick-xml's Reader that provides:
/// - Owned events, so handlers can recurse without fighting buffer borrows
/// - Path tracking for better error messages
pub struct XmlCursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Path stack for error context (e.g., ["report", "body", "table"])
    path: Vec<String>,
}

impl<'a> XmlCursor<&'a [u8]> {
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(Reader::from_str(xml))
    }
}

impl<R: BufRead> XmlCursor<R> {
    /// Wrap a reader. Text is reported exactly as written, whitespace
    /// included, so callers skip the `Node::Text` they do not want.
    pub fn new(reader: Reader<R>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn from_reader(source: R) -> Self {
        Self::new(Reader::from_reader(source))
    }

    /// Push an element onto the path stack (for error context).
    pub fn push_path(&mut self, element: &str) {
        self.path.push(element.to_string());
    }

    /// Pop the most recent element from the path stack.
    pub fn pop_path(&mut self) {
        self.path.pop();
    }

    /// Get the current path as a string (for error messages).
    pub fn path_str(&self) -> String {
        self.path.join("/")
    }

    /// Byte offset of the reader in the input.
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    /// Create an error with path context.
    pub fn error(&self, message: impl Into<String>) -> DeserializeError {
        let msg = message.into();
        if self.path.is_empty() {
            DeserializeError::Custom(msg)
        } else {
            DeserializeError::Custom(format!("{} (at {})", msg, self.path_str()))
        }
    }

    /// Read the next node that matters to the parser.
    ///
    /// Comments, processing instructions and the XML declaration are skipped.
    pub fn next_node(&mut self) -> Result<Node, DeserializeError> {
        loop {
            self.buf.clear();
            let node = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => Node::Open {
                    name: e.name().as_ref().to_vec(),
                    attrs: Attrs::from_start(&e, &self.reader)?,
                    empty: false,
                },
                Event::Empty(e) => Node::Open {
                    name: e.name().as_ref().to_vec(),
                    attrs: Attrs::from_start(&e, &self.reader)?,
                    empty: true,
                },
                Event::End(e) => Node::Close(e.name().as_ref().to_vec()),
                Event::Text(e) => Node::Text(e.unescape()?.into_owned()),
                Event::CData(e) => Node::Text(String::from_utf8_lossy(e.as_ref()).into_owned()),
                Event::Eof => Node::Eof,
                _ => continue,
            };
            return Ok(node);
        }
    }

    /// Read text content from the current element (after consuming its start tag).
    ///
    /// Reads until the matching end tag. Text inside nested elements is ignored.
    pub fn read_text(&mut self) -> Result<String, DeserializeError> {
        let mut text = String::new();

        loop {
            match self.next_node()? {
                Node::Text(t) => text.push_str(&t),
                Node::Open {
                    name, empty: false, ..
                } => self.skip_to_end(&name)?,
                Node::Open { .. } => {}
                Node::Close(_) => break,
                Node::Eof => return Err(DeserializeError::UnexpectedEof),
            }
        }

        Ok(text)
    }

    /// Skip the current element's content (after consuming a Start event).
    pub fn skip_to_end(&mut self, tag_name: &[u8]) -> Result<(), DeserializeError> {
        skip_element(&mut self.reader, &mut self.buf, tag_name)
    }
}

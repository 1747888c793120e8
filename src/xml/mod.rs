//! Reading report designs from XML.
//!
//! The entry points live on [`ReportDesign`]:
//!
//! ```
//! use rptdesign::ReportDesign;
//!
//! let xml = r#"<report version="3.2.23"><body><label name="title"/></body></report>"#;
//! let design = ReportDesign::from_str(xml).unwrap();
//! assert_eq!(design.len(), 1);
//! assert!(design.diagnostics().is_empty());
//! ```

pub mod deserialize;
pub mod errors;
pub mod quick;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::DesignVersion;
use crate::model::ReportDesign;
use crate::xml::deserialize::{DeserializeError, ParserContext, deserialize_design_impl};
use crate::xml::quick::XmlCursor;

pub use errors::{Diagnostic, ErrorContext, ErrorHandler, ParseError, SemanticError, Severity};

/// Knobs for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// First format version in which duplicate element ids are reported.
    pub strict_id_version: DesignVersion,
    /// Version assumed when the root tag has no `version` attribute.
    pub default_version: DesignVersion,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_id_version: DesignVersion::STRICT_ELEMENT_ID,
            default_version: DesignVersion::CURRENT,
        }
    }
}

impl ReportDesign {
    /// Parse a design from a string with default options.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &str) -> Result<Self, ParseError> {
        Self::from_str_with_options(xml, ParseOptions::default())
    }

    pub fn from_str_with_options(xml: &str, options: ParseOptions) -> Result<Self, ParseError> {
        let mut cursor = XmlCursor::from_str(xml);
        read_design(&mut cursor, ParserContext::new(options))
    }

    /// Parse a design from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R, options: ParseOptions) -> Result<Self, ParseError> {
        let mut cursor = XmlCursor::from_reader(reader);
        read_design(&mut cursor, ParserContext::new(options))
    }

    /// Parse a design file. Diagnostics and errors mention the path.
    pub fn from_file<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut cursor = XmlCursor::from_reader(BufReader::new(file));
        let mut ctx = ParserContext::new(options);
        ctx.set_file_path(path.to_path_buf());
        read_design(&mut cursor, ctx).map_err(|err| match err {
            ParseError::Xml { source, context } => ParseError::Xml {
                source,
                context: ErrorContext {
                    file_path: Some(path.to_path_buf()),
                    ..context
                },
            },
            other => other,
        })
    }
}

fn read_design<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    ctx: ParserContext,
) -> Result<ReportDesign, ParseError> {
    deserialize_design_impl(cursor, ctx).map_err(|source| {
        let context = ErrorContext::with_position(cursor.position());
        let context = match cursor.path_str() {
            path if path.is_empty() => context,
            path => context.with_parsing(path),
        };
        match source {
            DeserializeError::Io(err) => ParseError::Io(err),
            source => ParseError::Xml { source, context },
        }
    })
}

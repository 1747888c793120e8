use std::io::Write;

use anyhow::Result;
use rptdesign::xml::ErrorContext;
use rptdesign::xml::deserialize::DeserializeError;
use rptdesign::{ParseError, ParseOptions, ReportDesign, SemanticError, Severity};

#[test]
fn test_diagnostics_carry_position_and_context() -> Result<()> {
    let xml = r#"<report version="3.2.23">
    <body>
        <label name="a" id="5"/>
        <label name="b" id="5"/>
    </body>
</report>"#;
    let design = ReportDesign::from_str(xml)?;

    assert_eq!(design.diagnostics().len(), 1);
    let diagnostic = &design.diagnostics()[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(
        diagnostic.error,
        SemanticError::DuplicateElementId {
            id: "5".parse()?,
            owner: "label(\"a\")".to_string(),
            requester: "label(\"b\")".to_string(),
        }
    );
    let position = diagnostic.context.position.expect("No position recorded");
    assert!(position > xml.find("name=\"a\"").unwrap_or_default());
    assert_eq!(diagnostic.context.parsing.as_deref(), Some("element id"));

    let message = diagnostic.to_string();
    assert!(message.starts_with("error at byte"), "{}", message);
    assert!(message.ends_with("element id 5 of label(\"b\") is already used by label(\"a\")"));
    Ok(())
}

#[test]
fn test_unresolved_extends_is_a_warning() -> Result<()> {
    let xml = r#"<report><body><table name="t" extends="Missing"/></body></report>"#;
    let design = ReportDesign::from_str(xml)?;

    let warnings: Vec<_> = design.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].error,
        SemanticError::UnresolvedExtends {
            element: "table(\"t\")".to_string(),
            reference: "Missing".to_string(),
        }
    );
    // Raised after the document was read, so no byte offset applies.
    assert_eq!(warnings[0].context.position, None);
    assert_eq!(design.errors().count(), 0);
    Ok(())
}

#[test]
fn test_malformed_xml_is_fatal() {
    let result = ReportDesign::from_str("<report><body><label></body></report>");
    let err = result.expect_err("Mismatched tags must fail");
    assert!(matches!(
        err,
        ParseError::Xml {
            source: DeserializeError::Xml(_),
            ..
        }
    ));
}

#[test]
fn test_one_bad_record_does_not_stop_the_parse() -> Result<()> {
    let xml = r#"<report version="3.2.23">
    <components>
        <list name="Base" id="1"><label name="header" id="2"/></list>
    </components>
    <body>
        <list name="L" extends="Base">
            <overridden-values>
                <ref-entry baseId="x"><property name="text">a</property></ref-entry>
                <ref-entry baseId="2" id="-4"/>
                <ref-entry baseId="3"/>
                <ref-entry baseId="2" name="caption"><property name="text">ok</property></ref-entry>
            </overridden-values>
        </list>
        <label name="after"/>
    </body>
</report>"#;
    let design = ReportDesign::from_str(xml)?;

    let kinds: Vec<_> = design
        .diagnostics()
        .iter()
        .map(|d| (d.severity, std::mem::discriminant(&d.error)))
        .collect();
    let invalid = std::mem::discriminant(&SemanticError::InvalidElementId {
        element: String::new(),
        value: String::new(),
    });
    let orphan = std::mem::discriminant(&SemanticError::VirtualParentNotFound {
        owner: String::new(),
        base_id: String::new(),
    });
    assert_eq!(
        kinds,
        vec![
            (Severity::Error, invalid),
            (Severity::Error, invalid),
            (Severity::Warning, orphan),
        ]
    );

    let summary = design
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    assert!(summary.contains("invalid element id 'x'"), "{}", summary);
    assert!(summary.contains("invalid element id '-4'"), "{}", summary);

    assert_eq!(design.slot(rptdesign::Slot::Body).len(), 2);
    Ok(())
}

#[test]
fn test_from_file_reports_path() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"<report version="3.2.23"><body><label id="0"/></body></report>"#
    )?;
    file.flush()?;

    let design = ReportDesign::from_file(file.path(), ParseOptions::default())?;
    let diagnostic = &design.diagnostics()[0];
    assert_eq!(diagnostic.context.file_path.as_deref(), Some(file.path()));
    assert!(diagnostic.to_string().contains("in file"));
    Ok(())
}

#[test]
fn test_from_file_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.rptdesign");
    let err = ReportDesign::from_file(&missing, ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));

    let truncated = dir.path().join("truncated.rptdesign");
    std::fs::write(&truncated, "<report><body>")?;
    let err = ReportDesign::from_file(&truncated, ParseOptions::default()).unwrap_err();
    let ParseError::Xml { context, .. } = err else {
        panic!("Expected an XML error, got {:?}", err);
    };
    assert_eq!(context.file_path.as_deref(), Some(truncated.as_path()));
    Ok(())
}

#[test]
fn test_error_context_display() {
    let context = ErrorContext::with_file_path("design.rptdesign")
        .with_parsing("ref-entry");
    assert_eq!(
        context.to_string(),
        " in file 'design.rptdesign', while parsing ref-entry"
    );
}

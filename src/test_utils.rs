#![cfg(test)]

use crate::model::ReportDesign;

/// Route `log` output to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wrap component and body snippets in a minimal current-version design.
pub fn wrap_design_xml(components_xml: &str, body_xml: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<report xmlns="http://www.eclipse.org/birt/2005/design" version="3.2.23">
    <components>
        {}
    </components>
    <body>
        {}
    </body>
</report>"#,
        components_xml, body_xml
    )
}

/// A table template `BaseTable` (id 1) with a row (2), a cell (3) and a
/// label `total` (4).
pub const BASE_TABLE: &str = r#"
    <table name="BaseTable" id="1">
        <row id="2">
            <cell id="3">
                <label name="total" id="4">
                    <property name="text">Total</property>
                </label>
            </cell>
        </row>
    </table>"#;

/// Parse a design assembled by [`wrap_design_xml`].
pub fn parse_design(components_xml: &str, body_xml: &str) -> ReportDesign {
    init_logging();
    let xml = wrap_design_xml(components_xml, body_xml);
    ReportDesign::from_str(&xml).expect("Failed to parse design")
}

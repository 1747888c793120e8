//! Performance benchmarks for design parsing.
//!
//! Measures plain parsing, template extension with overridden values, and the
//! deferred path where every template is defined after its users.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rptdesign::{ParseError, ReportDesign};

fn parse_xml(xml: &str) -> Result<ReportDesign, ParseError> {
    ReportDesign::from_str(xml)
}

const TEMPLATE: &str = r#"
    <table name="BaseTable" id="1">
        <row id="2">
            <cell id="3"><label name="title" id="4"><property name="text">Title</property></label></cell>
            <cell id="5"><data name="value" id="6"><expression name="resultSetColumn">row["v"]</expression></data></cell>
        </row>
    </table>"#;

fn derived_tables(count: usize) -> String {
    (0..count)
        .map(|i| {
            format!(
                r#"<table name="T{i}" extends="BaseTable">
                    <overridden-values>
                        <ref-entry baseId="4" id="{}" name="title{i}"><property name="text">Title {i}</property></ref-entry>
                        <ref-entry baseId="6"><expression name="resultSetColumn">row["c{i}"]</expression></ref-entry>
                    </overridden-values>
                </table>"#,
                1000 + i
            )
        })
        .collect()
}

fn backward_design(count: usize) -> String {
    format!(
        r#"<report version="3.2.23"><components>{}</components><body>{}</body></report>"#,
        TEMPLATE,
        derived_tables(count)
    )
}

fn forward_design(count: usize) -> String {
    format!(
        r#"<report version="3.2.23"><body>{}</body><components>{}</components></report>"#,
        derived_tables(count),
        TEMPLATE
    )
}

fn bench_parse_simple(c: &mut Criterion) {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<report version="3.2.23">
    <styles>
        <style name="Alert">
            <property name="highlightTestExpr">row["status"]</property>
            <list-property name="highlightRules"><structure/><structure/></list-property>
        </style>
    </styles>
    <body>
        <label name="title"><property name="text">Hello</property></label>
    </body>
</report>"#;

    c.bench_function("parse_simple", |b| b.iter(|| parse_xml(black_box(xml))));
}

fn bench_parse_overrides(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_overrides");
    for count in [10, 100] {
        let backward = backward_design(count);
        let forward = forward_design(count);
        group.bench_with_input(BenchmarkId::new("backward", count), &backward, |b, xml| {
            b.iter(|| parse_xml(black_box(xml)))
        });
        group.bench_with_input(BenchmarkId::new("forward", count), &forward, |b, xml| {
            b.iter(|| parse_xml(black_box(xml)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_simple, bench_parse_overrides);
criterion_main!(benches);

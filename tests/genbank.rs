use std::fs;

use kira_taxscan::genbank::parse_records;

#[test]
fn parse_fixture_records() {
    let text = fs::read_to_string("tests/fixtures/sequences.gb").unwrap();
    let records = parse_records(&text).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].accession, "MZ000101.1");
    assert_eq!(records[0].length, 150);
    assert_eq!(
        records[0].description,
        "Homo sapiens isolate HG-01 mitochondrion D-loop, partial sequence"
    );
    assert_eq!(records[1].length, 120);
    assert_eq!(
        records[1].description,
        "Homo sapiens isolate HG-02 cytochrome b (CYTB) gene, partial cds; mitochondrial"
    );
    assert_eq!(records[2].accession, "MZ000103.1");
    assert_eq!(records[2].length, 180);
}

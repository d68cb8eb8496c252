use sales_report::{import_file, Column, Mode, ParseError, Session};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sales" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Cell XML: numbers as `<v>`, everything else as an inline string.
fn cell(reference: &str, value: &str) -> String {
    if value.parse::<f64>().is_ok() {
        format!(r#"<c r="{reference}"><v>{value}</v></c>"#)
    } else {
        format!(r#"<c r="{reference}" t="inlineStr"><is><t>{value}</t></is></c>"#)
    }
}

/// Write a one-sheet `.xlsx` holding `rows`; empty strings leave the cell out.
fn write_workbook(path: &Path, rows: &[&[&str]]) {
    let mut sheet_data = String::new();
    for (r, row) in rows.iter().enumerate() {
        sheet_data.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
            sheet_data.push_str(&cell(&reference, value));
        }
        sheet_data.push_str("</row>");
    }
    let sheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#
    );

    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn xlsx_first_sheet_imports_by_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("targets.xlsx");
    write_workbook(
        &path,
        &[
            &["Customer", "Sales", "Goal"],
            &["Alpha", "100", "50"],
            &["Beta", "1,200", "1000"],
            &["", "5", "5"],
            &["Gamma", "n/a", "10"],
        ],
    );

    let (table, report) = import_file(&path, Mode::TargetAchievement).unwrap();
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.accepted_rows, 2);
    assert_eq!(report.dropped_rows, 2);
    assert_eq!(report.delimiter, None);

    let names: Vec<&str> = table.records().iter().map(|r| r.customer.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    let achievement = table.column(Column::Achievement).unwrap();
    assert!((achievement[0] - 200.0).abs() < 1e-9);
    assert!((achievement[1] - 120.0).abs() < 1e-9);
}

#[test]
fn xlsx_too_narrow_for_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.xlsx");
    write_workbook(&path, &[&["Customer", "Sales", "Lat"], &["Depot", "2500", "52.5"]]);

    let err = import_file(&path, Mode::Geographic).unwrap_err();
    assert!(matches!(
        err,
        ParseError::InsufficientColumns { required: 4, actual: 3, .. }
    ));
}

#[test]
fn broken_workbook_keeps_previous_table() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("sales.xlsx");
    write_workbook(&good, &[&["c", "cur", "prev"], &["A", "120", "100"]]);
    let bad = dir.path().join("broken.xlsx");
    std::fs::write(&bad, "Customer,Cur,Prev\nA,1,2\n").unwrap();

    let mut session = Session::new(Mode::YearOverYear);
    session.import_file(&good).unwrap();
    let err = session.import_file(&bad).unwrap_err();
    assert!(matches!(err, ParseError::Workbook(_)));
    let table = session.table().unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].get(Column::Growth), Some(20.0));
}

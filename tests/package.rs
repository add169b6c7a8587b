use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use pretty_assertions::assert_eq;
use xlsxcore::{Chart, ChartType, DocProperties, Format, Workbook, WorkbookOptions, XlsxError, ROW_MAX};

fn open(path: &Path) -> zip::ZipArchive<File> {
    zip::ZipArchive::new(File::open(path).unwrap()).unwrap()
}

fn part(archive: &mut zip::ZipArchive<File>, name: &str) -> String {
    let mut file = archive.by_name(name).unwrap_or_else(|_| panic!("missing part {}", name));
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

fn part_names(archive: &zip::ZipArchive<File>) -> Vec<String> {
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    fn chunk(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    let mut ihdr = width.to_be_bytes().to_vec();
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
    data.extend(chunk(b"IHDR", &ihdr));
    data.extend(chunk(b"IEND", &[]));
    data
}

#[test]
fn empty_workbook_gets_default_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");

    Workbook::new(&path).close().unwrap();

    let mut archive = open(&path);
    assert_eq!(
        part_names(&archive),
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/app.xml",
            "docProps/core.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/theme/theme1.xml",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
        ]
    );

    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n"));
    assert!(sheet.contains("<dimension ref=\"A1\"/>"));
    assert!(sheet.contains("<sheetView tabSelected=\"1\" workbookViewId=\"0\"/>"));
    assert!(sheet.contains("<sheetData/>"));
}

#[test]
fn shared_strings_only_when_strings_written() {
    let dir = tempfile::tempdir().unwrap();

    let numbers_only = dir.path().join("numbers.xlsx");
    let mut workbook = Workbook::new(&numbers_only);
    workbook.add_worksheet(None).unwrap().write_number(0, 0, 1.5, None).unwrap();
    workbook.close().unwrap();

    let mut archive = open(&numbers_only);
    assert!(archive.by_name("xl/sharedStrings.xml").is_err());
    assert!(!part(&mut archive, "[Content_Types].xml").contains("sharedStrings"));
    assert!(!part(&mut archive, "xl/_rels/workbook.xml.rels").contains("sharedStrings"));

    let with_string = dir.path().join("strings.xlsx");
    let mut workbook = Workbook::new(&with_string);
    let sheet = workbook.add_worksheet(None).unwrap();
    sheet.write_number(0, 0, 1.5, None).unwrap();
    sheet.write_string(1, 0, "Hello", None).unwrap();
    sheet.write_string(2, 0, "Hello", None).unwrap();
    workbook.close().unwrap();

    let mut archive = open(&with_string);
    assert_eq!(
        part(&mut archive, "xl/sharedStrings.xml"),
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"2\" uniqueCount=\"1\">\
         <si><t>Hello</t></si></sst>"
    );
    assert!(part(&mut archive, "[Content_Types].xml").contains(
        "<Override PartName=\"/xl/sharedStrings.xml\" \
         ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>"
    ));
    assert!(part(&mut archive, "xl/_rels/workbook.xml.rels").contains(
        "<Relationship Id=\"rId4\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" \
         Target=\"sharedStrings.xml\"/>"
    ));
}

#[test]
fn chart_caches_worksheet_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.xlsx");

    let mut workbook = Workbook::new(&path);
    let sheet = workbook.add_worksheet(None).unwrap();
    for (row, value) in [1.0, 2.0, 3.0].into_iter().enumerate() {
        sheet.write_number(row as u32, 0, value, None).unwrap();
    }

    let mut chart = Chart::new(ChartType::Column);
    chart.add_series(None, Some("=Sheet1!$A$1:$A$3")).unwrap();
    sheet.insert_chart(4, 2, chart).unwrap();
    workbook.close().unwrap();

    let mut archive = open(&path);
    let chart = part(&mut archive, "xl/charts/chart1.xml");
    assert!(chart.contains(
        "<c:val><c:numRef><c:f>Sheet1!$A$1:$A$3</c:f><c:numCache><c:formatCode>General</c:formatCode>\
         <c:ptCount val=\"3\"/>\
         <c:pt idx=\"0\"><c:v>1</c:v></c:pt>\
         <c:pt idx=\"1\"><c:v>2</c:v></c:pt>\
         <c:pt idx=\"2\"><c:v>3</c:v></c:pt>\
         </c:numCache></c:numRef></c:val>"
    ));

    let sheet_rels = part(&mut archive, "xl/worksheets/_rels/sheet1.xml.rels");
    assert!(sheet_rels.contains("Target=\"../drawings/drawing1.xml\""));
    assert!(part(&mut archive, "xl/worksheets/sheet1.xml").contains("<drawing r:id=\"rId1\"/>"));

    let drawing_rels = part(&mut archive, "xl/drawings/_rels/drawing1.xml.rels");
    assert!(drawing_rels.contains("Target=\"../charts/chart1.xml\""));

    let content_types = part(&mut archive, "[Content_Types].xml");
    assert!(content_types.contains("PartName=\"/xl/charts/chart1.xml\""));
    assert!(content_types.contains("PartName=\"/xl/drawings/drawing1.xml\""));
}

#[test]
fn chart_cache_skipped_for_constant_memory_and_unknown_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optimized.xlsx");

    let options = WorkbookOptions::new().set_constant_memory(true).set_tmpdir(dir.path());
    let mut workbook = Workbook::new_with_options(&path, options);
    let sheet = workbook.add_worksheet(None).unwrap();
    sheet.write_number(0, 0, 1.0, None).unwrap();
    sheet.write_number(1, 0, 2.0, None).unwrap();

    let mut chart = Chart::new(ChartType::Line);
    chart.add_series(None, Some("=Sheet1!$A$1:$A$2")).unwrap();
    chart.add_series(None, Some("=Missing!$A$1:$A$2")).unwrap();
    sheet.insert_chart(0, 3, chart).unwrap();
    workbook.close().unwrap();

    let mut archive = open(&path);
    let chart = part(&mut archive, "xl/charts/chart1.xml");
    assert!(chart.contains("<c:f>Sheet1!$A$1:$A$2</c:f>"));
    assert!(chart.contains("<c:f>Missing!$A$1:$A$2</c:f>"));
    assert!(!chart.contains("<c:numCache>"));
}

#[test]
fn chart_ranges_outside_the_sheet_are_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.xlsx");

    let mut workbook = Workbook::new(&path);
    let sheet = workbook.add_worksheet(None).unwrap();
    sheet.write_number(0, 0, 1.0, None).unwrap();

    let mut chart = Chart::new(ChartType::Column);
    chart.add_series(None, Some("=Sheet1!$ZZZZZZZZ$1:$ZZZZZZZZ$3")).unwrap();
    chart.add_series(None, Some("=Sheet1!$A$1:$A$1048577")).unwrap();
    sheet.insert_chart(2, 2, chart).unwrap();
    workbook.close().unwrap();

    let mut archive = open(&path);
    let chart = part(&mut archive, "xl/charts/chart1.xml");
    assert!(chart.contains("<c:f>Sheet1!$ZZZZZZZZ$1:$ZZZZZZZZ$3</c:f>"));
    assert!(!chart.contains("<c:numCache>"));
}

#[test]
fn hyperlinks_and_images_get_relationships() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("logo.png");
    fs::write(&image_path, png_bytes(64, 32)).unwrap();
    let path = dir.path().join("links.xlsx");

    let mut workbook = Workbook::new(&path);
    let sheet = workbook.add_worksheet(None).unwrap();
    sheet.write_url(0, 0, "https://example.com/", None).unwrap();
    sheet.write_url(1, 0, "internal:Sheet1!C5", None).unwrap();
    sheet.insert_image(3, 1, &image_path).unwrap();
    workbook.close().unwrap();

    let mut archive = open(&path);
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<hyperlink ref=\"A1\" r:id=\"rId1\"/>"));
    assert!(sheet.contains("<hyperlink ref=\"A2\" location=\"Sheet1!C5\" display=\"Sheet1!C5\"/>"));
    assert!(sheet.contains("<drawing r:id=\"rId2\"/>"));

    let sheet_rels = part(&mut archive, "xl/worksheets/_rels/sheet1.xml.rels");
    assert!(sheet_rels.contains(
        "<Relationship Id=\"rId1\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink\" \
         Target=\"https://example.com/\" TargetMode=\"External\"/>"
    ));
    assert!(sheet_rels.contains("Id=\"rId2\""));

    assert!(part(&mut archive, "xl/drawings/_rels/drawing1.xml.rels")
        .contains("Target=\"../media/image1.png\""));
    assert!(part(&mut archive, "[Content_Types].xml")
        .contains("<Default Extension=\"png\" ContentType=\"image/png\"/>"));

    let mut media = Vec::new();
    archive.by_name("xl/media/image1.png").unwrap().read_to_end(&mut media).unwrap();
    assert_eq!(media, png_bytes(64, 32));
}

#[test]
fn styles_indexed_in_first_use_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("styles.xlsx");

    let mut workbook = Workbook::new(&path);
    let italic = workbook.add_format(Format::new().set_italic());
    let bold = workbook.add_format(Format::new().set_bold());
    let bold_again = workbook.add_format(Format::new().set_bold());

    let sheet = workbook.add_worksheet(None).unwrap();
    sheet.write_number(0, 0, 1.0, Some(bold)).unwrap();
    sheet.write_number(1, 0, 2.0, Some(italic)).unwrap();
    sheet.write_number(2, 0, 3.0, Some(bold_again)).unwrap();
    workbook.close().unwrap();

    let mut archive = open(&path);
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<c r=\"A1\" s=\"1\"><v>1</v></c>"));
    assert!(sheet.contains("<c r=\"A2\" s=\"2\"><v>2</v></c>"));
    assert!(sheet.contains("<c r=\"A3\" s=\"1\"><v>3</v></c>"));

    let styles = part(&mut archive, "xl/styles.xml");
    assert!(styles.contains("<cellXfs count=\"3\">"));
    assert!(styles.contains("<fonts count=\"3\">"));
}

#[test]
fn defined_names_and_properties_reach_the_package() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.xlsx");

    let mut workbook = Workbook::new(&path);
    let sheet = workbook.add_worksheet(Some("Data")).unwrap();
    sheet.write_number(0, 0, 1.0, None).unwrap();
    sheet.print_area(0, 0, 9, 3).unwrap();
    workbook.define_name("Rate", "=0.96").unwrap();
    workbook.set_properties(&DocProperties {
        title: "Quarterly".to_string(),
        company: "Acme".to_string(),
        ..DocProperties::default()
    });
    workbook.set_custom_property_string("Checked by", "Eve").unwrap();
    workbook.close().unwrap();

    let mut archive = open(&path);
    let workbook_xml = part(&mut archive, "xl/workbook.xml");
    assert!(workbook_xml.contains(
        "<definedNames>\
         <definedName name=\"_xlnm.Print_Area\" localSheetId=\"0\">Data!$A$1:$D$10</definedName>\
         <definedName name=\"Rate\">0.96</definedName>\
         </definedNames>"
    ));

    let app = part(&mut archive, "docProps/app.xml");
    assert!(app.contains("<vt:lpstr>Named Ranges</vt:lpstr>"));
    assert!(app.contains("<vt:lpstr>Data!Print_Area</vt:lpstr>"));
    assert!(app.contains("<Company>Acme</Company>"));

    assert!(part(&mut archive, "docProps/core.xml").contains("<dc:title>Quarterly</dc:title>"));
    assert!(part(&mut archive, "docProps/custom.xml").contains("<vt:lpwstr>Eve</vt:lpwstr>"));
    assert!(part(&mut archive, "_rels/.rels").contains("Target=\"docProps/custom.xml\""));
}

#[test]
fn dimension_and_row_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("limits.xlsx");

    let mut workbook = Workbook::new(&path);
    let sheet = workbook.add_worksheet(None).unwrap();
    sheet.write_number(2, 1, 1.0, None).unwrap();
    sheet.write_number(ROW_MAX - 1, 3, 2.0, None).unwrap();
    assert!(matches!(
        sheet.write_number(ROW_MAX, 0, 3.0, None),
        Err(XlsxError::WorksheetIndexOutOfRange)
    ));
    assert!(matches!(
        sheet.merge_range(4, 4, 4, 4, "one cell", None),
        Err(XlsxError::ParameterValidation)
    ));
    assert_eq!(sheet.dimensions(), Some((2, 1, ROW_MAX - 1, 3)));
    workbook.close().unwrap();

    let mut archive = open(&path);
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<dimension ref=\"B3:D1048576\"/>"));
    assert!(sheet.contains("<c r=\"D1048576\"><v>2</v></c>"));
}

#[test]
fn failed_close_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("gone.png");
    fs::write(&image_path, png_bytes(8, 8)).unwrap();
    let path = dir.path().join("broken.xlsx");

    let mut workbook = Workbook::new(&path);
    workbook.add_worksheet(None).unwrap().insert_image(0, 0, &image_path).unwrap();
    fs::remove_file(&image_path).unwrap();

    assert!(workbook.close().is_err());
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

use std::fs::{self, File};

use chrono::Utc;
use log::{debug, error};
use mtzip::{level::CompressionLevel, ZipArchive};

use crate::content_types::ContentTypes;
use crate::doc_props::{assemble_app_xml, assemble_core_xml, assemble_custom_xml};
use crate::error::{Result, XlsxError};
use crate::image::ImageType;
use crate::relationships::Relationships;
use crate::theme;
use crate::workbook::Workbook;

/// Collects the parts of one package in memory before the archive is
/// written out.
struct Package {
    zipper: ZipArchive<'static, 'static, 'static>,
    content_types: ContentTypes,
}

impl Package {
    fn add_part(&mut self, data: Vec<u8>, path: String) {
        debug!("packager: {} ({} bytes)", path, data.len());
        self.zipper
            .add_file_from_memory(data, path)
            .compression_level(CompressionLevel::best())
            .done();
    }
}

/// Serialize every part of `workbook` into `file` as an `.xlsx` archive.
/// The workbook must already have run its preparation passes.
pub(crate) fn create_package(workbook: &mut Workbook, file: &mut File) -> Result<()> {
    let mut package = Package { zipper: ZipArchive::new(), content_types: ContentTypes::new() };

    let sheet_rels = write_worksheet_files(workbook, &mut package)?;
    workbook.styles.borrow_mut().prepare();

    package.add_part(workbook.assemble_xml_file(), "xl/workbook.xml".to_string());
    write_chart_files(workbook, &mut package);
    let drawing_rels = write_drawing_files(workbook, &mut package);

    let has_strings = workbook.sst.borrow().string_count() > 0;
    if has_strings {
        let xml = workbook.sst.borrow().assemble_xml_file();
        package.add_part(xml, "xl/sharedStrings.xml".to_string());
        package.content_types.add_shared_strings();
    }

    write_app_file(workbook, &mut package);
    package.add_part(
        assemble_core_xml(&workbook.properties, Utc::now()),
        "docProps/core.xml".to_string(),
    );
    let has_custom = !workbook.custom_properties.is_empty();
    if has_custom {
        package.add_part(assemble_custom_xml(&workbook.custom_properties), "docProps/custom.xml".to_string());
        package.content_types.add_custom_properties();
    }

    package.add_part(theme::assemble_xml_file(), "xl/theme/theme1.xml".to_string());
    let styles = workbook.styles.borrow().assemble_xml_file();
    package.add_part(styles, "xl/styles.xml".to_string());

    for image_type in [ImageType::Png, ImageType::Jpeg, ImageType::Bmp] {
        let used = workbook
            .worksheets
            .iter()
            .any(|worksheet| worksheet.images.iter().any(|image| image.image_type == image_type));
        if used {
            package.content_types.add_image_type(image_type.extension());
        }
    }
    let content_types = package.content_types.assemble_xml_file();
    package.add_part(content_types, "[Content_Types].xml".to_string());

    write_workbook_rels_file(workbook, &mut package, has_strings);
    for (sheet_number, rels) in sheet_rels {
        package.add_part(
            rels.assemble_xml_file(),
            format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_number),
        );
    }
    for (drawing_number, rels) in drawing_rels {
        package.add_part(rels, format!("xl/drawings/_rels/drawing{}.xml.rels", drawing_number));
    }

    write_root_rels_file(&mut package, has_custom);
    write_image_files(workbook, &mut package)?;

    package.zipper.write(file).map_err(|e| {
        error!("packager: error writing zip archive: {}", e);
        XlsxError::ZipClose(e.to_string())
    })?;
    Ok(())
}

/// Returns the relationships of sheets that link to anything, keyed by the
/// 1-based sheet number.
fn write_worksheet_files(
    workbook: &mut Workbook,
    package: &mut Package,
) -> Result<Vec<(usize, Relationships)>> {
    let mut sheet_rels = Vec::new();

    for (index, worksheet) in workbook.worksheets.iter_mut().enumerate() {
        let sheet_number = index + 1;
        let (xml, rels) = worksheet.assemble_xml_file().map_err(|e| {
            error!("packager: error assembling worksheet '{}': {}", worksheet.name(), e);
            e
        })?;

        package.add_part(xml, format!("xl/worksheets/sheet{}.xml", sheet_number));
        package.content_types.add_worksheet_name(&format!("sheet{}", sheet_number));
        if !rels.is_empty() {
            sheet_rels.push((sheet_number, rels));
        }
    }
    Ok(sheet_rels)
}

/// Charts are numbered by sheet, then by insertion within the sheet.
fn write_chart_files(workbook: &Workbook, package: &mut Package) {
    let charts = workbook.worksheets.iter().flat_map(|worksheet| worksheet.charts.iter());
    for (index, object) in charts.enumerate() {
        let chart_number = index + 1;
        package.add_part(object.chart.assemble_xml_file(), format!("xl/charts/chart{}.xml", chart_number));
        package.content_types.add_chart_name(&format!("chart{}", chart_number));
    }
}

fn write_drawing_files(workbook: &Workbook, package: &mut Package) -> Vec<(usize, Vec<u8>)> {
    let mut drawing_rels = Vec::new();
    let drawings = workbook
        .worksheets
        .iter()
        .filter_map(|worksheet| worksheet.drawing().map(|drawing| (drawing, worksheet.drawing_rels())));

    for (index, (drawing, rels)) in drawings.enumerate() {
        let drawing_number = index + 1;
        package.add_part(drawing.assemble_xml_file(), format!("xl/drawings/drawing{}.xml", drawing_number));
        package.content_types.add_drawing_name(&format!("drawing{}", drawing_number));
        if !rels.is_empty() {
            drawing_rels.push((drawing_number, rels.assemble_xml_file()));
        }
    }
    drawing_rels
}

fn write_app_file(workbook: &Workbook, package: &mut Package) {
    let mut part_names: Vec<String> =
        workbook.worksheets.iter().map(|worksheet| worksheet.name().to_string()).collect();
    let mut heading_pairs = vec![("Worksheets", part_names.len())];

    let named_ranges = workbook.named_range_titles();
    if !named_ranges.is_empty() {
        heading_pairs.push(("Named Ranges", named_ranges.len()));
        part_names.extend(named_ranges);
    }

    package.add_part(
        assemble_app_xml(&workbook.properties, &heading_pairs, &part_names),
        "docProps/app.xml".to_string(),
    );
}

fn write_workbook_rels_file(workbook: &Workbook, package: &mut Package, has_strings: bool) {
    let mut rels = Relationships::new();
    for index in 0..workbook.worksheets.len() {
        rels.add_document_relationship("/worksheet", &format!("worksheets/sheet{}.xml", index + 1));
    }
    rels.add_document_relationship("/theme", "theme/theme1.xml");
    rels.add_document_relationship("/styles", "styles.xml");
    if has_strings {
        rels.add_document_relationship("/sharedStrings", "sharedStrings.xml");
    }
    package.add_part(rels.assemble_xml_file(), "xl/_rels/workbook.xml.rels".to_string());
}

fn write_root_rels_file(package: &mut Package, has_custom: bool) {
    let mut rels = Relationships::new();
    rels.add_document_relationship("/officeDocument", "xl/workbook.xml");
    rels.add_package_relationship("/metadata/core-properties", "docProps/core.xml");
    rels.add_document_relationship("/extended-properties", "docProps/app.xml");
    if has_custom {
        rels.add_document_relationship("/custom-properties", "docProps/custom.xml");
    }
    package.add_part(rels.assemble_xml_file(), "_rels/.rels".to_string());
}

/// Copy each inserted image into `xl/media`, numbered in the same order the
/// drawings reference them.
fn write_image_files(workbook: &Workbook, package: &mut Package) -> Result<()> {
    let images = workbook.worksheets.iter().flat_map(|worksheet| worksheet.images.iter());
    for (index, image) in images.enumerate() {
        let data = fs::read(&image.path).map_err(|e| {
            error!("packager: error reading image '{}': {}", image.path.display(), e);
            XlsxError::ZipFileOperation(e.to_string())
        })?;
        package.add_part(
            data,
            format!("xl/media/image{}.{}", index + 1, image.image_type.extension()),
        );
    }
    Ok(())
}

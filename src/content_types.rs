use crate::xml::{Attr, XmlWriter};

const SCHEMA_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const APP_PACKAGE: &str = "application/vnd.openxmlformats-package.";
const APP_DOCUMENT: &str = "application/vnd.openxmlformats-officedocument.";

/// `[Content_Types].xml`: one `Default` per extension and one `Override`
/// per part, in the order they were added.
#[derive(Debug)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTypes {
    /// The parts every workbook has.
    pub fn new() -> Self {
        let mut content_types = Self { defaults: Vec::new(), overrides: Vec::new() };

        content_types.add_default("rels", &format!("{}relationships+xml", APP_PACKAGE));
        content_types.add_default("xml", "application/xml");

        content_types.add_override("/docProps/app.xml", &format!("{}extended-properties+xml", APP_DOCUMENT));
        content_types.add_override("/docProps/core.xml", &format!("{}core-properties+xml", APP_PACKAGE));
        content_types.add_override("/xl/styles.xml", &format!("{}spreadsheetml.styles+xml", APP_DOCUMENT));
        content_types.add_override("/xl/theme/theme1.xml", &format!("{}theme+xml", APP_DOCUMENT));
        content_types.add_override(
            "/xl/workbook.xml",
            &format!("{}spreadsheetml.sheet.main+xml", APP_DOCUMENT),
        );
        content_types
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults.push((extension.to_string(), content_type.to_string()));
    }

    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides.push((part_name.to_string(), content_type.to_string()));
    }

    pub fn add_worksheet_name(&mut self, name: &str) {
        self.add_override(
            &format!("/xl/worksheets/{}.xml", name),
            &format!("{}spreadsheetml.worksheet+xml", APP_DOCUMENT),
        );
    }

    pub fn add_chart_name(&mut self, name: &str) {
        self.add_override(
            &format!("/xl/charts/{}.xml", name),
            &format!("{}drawingml.chart+xml", APP_DOCUMENT),
        );
    }

    pub fn add_drawing_name(&mut self, name: &str) {
        self.add_override(
            &format!("/xl/drawings/{}.xml", name),
            &format!("{}drawing+xml", APP_DOCUMENT),
        );
    }

    pub fn add_shared_strings(&mut self) {
        self.add_override(
            "/xl/sharedStrings.xml",
            &format!("{}spreadsheetml.sharedStrings+xml", APP_DOCUMENT),
        );
    }

    pub fn add_custom_properties(&mut self) {
        self.add_override(
            "/docProps/custom.xml",
            &format!("{}custom-properties+xml", APP_DOCUMENT),
        );
    }

    /// Image extensions (`png`, `jpeg`, `bmp`) used anywhere in the package.
    pub fn add_image_type(&mut self, extension: &str) {
        self.add_default(extension, &format!("image/{}", extension));
    }

    pub fn assemble_xml_file(&self) -> Vec<u8> {
        let mut writer =
            XmlWriter::with_capacity(512 + (self.defaults.len() + self.overrides.len()) * 128);
        writer.declaration();
        writer.start_tag("Types", &[Attr::str("xmlns", SCHEMA_CONTENT_TYPES)]);

        for (extension, content_type) in &self.defaults {
            writer.empty_tag(
                "Default",
                &[
                    Attr::str("Extension", extension.as_str()),
                    Attr::str("ContentType", content_type.as_str()),
                ],
            );
        }
        for (part_name, content_type) in &self.overrides {
            writer.empty_tag(
                "Override",
                &[
                    Attr::str("PartName", part_name.as_str()),
                    Attr::str("ContentType", content_type.as_str()),
                ],
            );
        }

        writer.end_tag("Types");
        writer.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_content_types() {
        let mut content_types = ContentTypes::new();
        content_types.add_image_type("png");
        content_types.add_worksheet_name("sheet1");
        content_types.add_shared_strings();

        let xml = String::from_utf8(content_types.assemble_xml_file()).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Default Extension=\"png\" ContentType=\"image/png\"/>\
             <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
             <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
             <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
             <Override PartName=\"/xl/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>\
             <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
             <Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
             <Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>\
             </Types>"
        );
    }

    #[test]
    fn test_object_parts() {
        let mut content_types = ContentTypes::new();
        content_types.add_chart_name("chart1");
        content_types.add_drawing_name("drawing1");
        content_types.add_custom_properties();

        let xml = String::from_utf8(content_types.assemble_xml_file()).unwrap();
        assert!(xml.contains("PartName=\"/xl/charts/chart1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.drawingml.chart+xml\""));
        assert!(xml.contains("PartName=\"/xl/drawings/drawing1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.drawing+xml\""));
        assert!(xml.contains("PartName=\"/docProps/custom.xml\""));
    }
}

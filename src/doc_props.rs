use chrono::{DateTime, Utc};

use crate::xml::{format_f64, Attr, XmlWriter};

const SCHEMA_CORE: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const SCHEMA_EXTENDED: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const SCHEMA_CUSTOM: &str = "http://schemas.openxmlformats.org/officeDocument/2006/custom-properties";
const SCHEMA_VTYPES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";
const CUSTOM_FORMAT_ID: &str = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}";
const W3CDTF: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Document summary shown in Excel's File > Info panel. Empty fields are
/// left out of the package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocProperties {
    pub title: String,
    pub subject: String,
    pub author: String,
    pub manager: String,
    pub company: String,
    pub category: String,
    pub keywords: String,
    pub comments: String,
    pub status: String,
    pub hyperlink_base: String,
    /// Creation time; the moment the workbook is closed when unset.
    pub created: Option<DateTime<Utc>>,
}

/// Value of a user-defined document property.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomPropertyValue {
    String(String),
    Number(f64),
    Integer(i32),
    Boolean(bool),
    Datetime(DateTime<Utc>),
}

impl CustomPropertyValue {
    fn vtype(&self) -> &'static str {
        match self {
            CustomPropertyValue::String(_) => "vt:lpwstr",
            CustomPropertyValue::Number(_) => "vt:r8",
            CustomPropertyValue::Integer(_) => "vt:i4",
            CustomPropertyValue::Boolean(_) => "vt:bool",
            CustomPropertyValue::Datetime(_) => "vt:filetime",
        }
    }

    fn to_xml_string(&self) -> String {
        match self {
            CustomPropertyValue::String(s) => s.clone(),
            CustomPropertyValue::Number(n) => format_f64(*n),
            CustomPropertyValue::Integer(i) => i.to_string(),
            CustomPropertyValue::Boolean(b) => b.to_string(),
            CustomPropertyValue::Datetime(dt) => dt.format(W3CDTF).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CustomProperty {
    pub name: String,
    pub value: CustomPropertyValue,
}

/// `docProps/core.xml`.
pub(crate) fn assemble_core_xml(properties: &DocProperties, now: DateTime<Utc>) -> Vec<u8> {
    let created = properties.created.unwrap_or(now).format(W3CDTF).to_string();

    let mut writer = XmlWriter::with_capacity(1024);
    writer.declaration();
    writer.start_tag(
        "cp:coreProperties",
        &[
            Attr::str("xmlns:cp", SCHEMA_CORE),
            Attr::str("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            Attr::str("xmlns:dcterms", "http://purl.org/dc/terms/"),
            Attr::str("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            Attr::str("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    );

    write_optional(&mut writer, "dc:title", &properties.title);
    write_optional(&mut writer, "dc:subject", &properties.subject);
    writer.data_element("dc:creator", &properties.author, &[]);
    write_optional(&mut writer, "cp:keywords", &properties.keywords);
    write_optional(&mut writer, "dc:description", &properties.comments);
    writer.data_element("cp:lastModifiedBy", &properties.author, &[]);

    let w3cdtf = [Attr::str("xsi:type", "dcterms:W3CDTF")];
    writer.data_element("dcterms:created", &created, &w3cdtf);
    writer.data_element("dcterms:modified", &created, &w3cdtf);

    write_optional(&mut writer, "cp:category", &properties.category);
    write_optional(&mut writer, "cp:contentStatus", &properties.status);

    writer.end_tag("cp:coreProperties");
    writer.into_bytes()
}

/// `docProps/app.xml`. `heading_pairs` are `(heading, count)` groups and
/// `part_names` lists the titles of those groups in the same order.
pub(crate) fn assemble_app_xml(
    properties: &DocProperties,
    heading_pairs: &[(&str, usize)],
    part_names: &[String],
) -> Vec<u8> {
    let mut writer = XmlWriter::with_capacity(1024 + part_names.len() * 48);
    writer.declaration();
    writer.start_tag(
        "Properties",
        &[Attr::str("xmlns", SCHEMA_EXTENDED), Attr::str("xmlns:vt", SCHEMA_VTYPES)],
    );

    writer.data_element("Application", "Microsoft Excel", &[]);
    writer.data_element("DocSecurity", "0", &[]);
    writer.data_element("ScaleCrop", "false", &[]);

    writer.start_tag("HeadingPairs", &[]);
    writer.start_tag(
        "vt:vector",
        &[Attr::int("size", heading_pairs.len() as i64 * 2), Attr::str("baseType", "variant")],
    );
    for (heading, count) in heading_pairs {
        writer.start_tag("vt:variant", &[]);
        writer.data_element("vt:lpstr", heading, &[]);
        writer.end_tag("vt:variant");
        writer.start_tag("vt:variant", &[]);
        writer.data_element("vt:i4", &count.to_string(), &[]);
        writer.end_tag("vt:variant");
    }
    writer.end_tag("vt:vector");
    writer.end_tag("HeadingPairs");

    writer.start_tag("TitlesOfParts", &[]);
    writer.start_tag(
        "vt:vector",
        &[Attr::int("size", part_names.len() as i64), Attr::str("baseType", "lpstr")],
    );
    for name in part_names {
        writer.data_element("vt:lpstr", name, &[]);
    }
    writer.end_tag("vt:vector");
    writer.end_tag("TitlesOfParts");

    write_optional(&mut writer, "Manager", &properties.manager);
    writer.data_element("Company", &properties.company, &[]);
    writer.data_element("LinksUpToDate", "false", &[]);
    writer.data_element("SharedDoc", "false", &[]);
    write_optional(&mut writer, "HyperlinkBase", &properties.hyperlink_base);
    writer.data_element("HyperlinksChanged", "false", &[]);
    writer.data_element("AppVersion", "12.0000", &[]);

    writer.end_tag("Properties");
    writer.into_bytes()
}

/// `docProps/custom.xml`. Property ids start at 2.
pub(crate) fn assemble_custom_xml(properties: &[CustomProperty]) -> Vec<u8> {
    let mut writer = XmlWriter::with_capacity(512 + properties.len() * 160);
    writer.declaration();
    writer.start_tag(
        "Properties",
        &[Attr::str("xmlns", SCHEMA_CUSTOM), Attr::str("xmlns:vt", SCHEMA_VTYPES)],
    );

    for (pid, property) in (2..).zip(properties) {
        writer.start_tag(
            "property",
            &[
                Attr::str("fmtid", CUSTOM_FORMAT_ID),
                Attr::int("pid", pid),
                Attr::str("name", property.name.as_str()),
            ],
        );
        writer.data_element(property.value.vtype(), &property.value.to_xml_string(), &[]);
        writer.end_tag("property");
    }

    writer.end_tag("Properties");
    writer.into_bytes()
}

fn write_optional(writer: &mut XmlWriter, tag: &str, value: &str) {
    if !value.is_empty() {
        writer.data_element(tag, value, &[]);
    }
}

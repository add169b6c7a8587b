use crate::xml::{Attr, XmlWriter};

pub const SCHEMA_PACKAGE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const SCHEMA_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const SCHEMA_MS: &str = "http://schemas.microsoft.com/office/2006/relationships";

/// One `<Relationship>` entry. `rel_type` is the full type URI.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub rel_type: String,
    pub target: String,
    pub target_mode: Option<String>,
}

/// A `.rels` part. Ids are assigned at write time, `rId1` upwards, in the
/// order relationships were added, so callers that emit `r:id` inline must
/// add them in the same order they reference them.
#[derive(Debug, Default)]
pub struct Relationships {
    relationships: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, schema: &str, rel_type: &str, target: &str, target_mode: Option<&str>) {
        self.relationships.push(Relationship {
            rel_type: format!("{}{}", schema, rel_type),
            target: target.to_string(),
            target_mode: target_mode.map(str::to_string),
        });
    }

    /// `rel_type` like `/worksheet`, prefixed with the officeDocument schema.
    pub fn add_document_relationship(&mut self, rel_type: &str, target: &str) {
        self.add(SCHEMA_DOCUMENT, rel_type, target, None);
    }

    pub fn add_package_relationship(&mut self, rel_type: &str, target: &str) {
        self.add(SCHEMA_PACKAGE, rel_type, target, None);
    }

    pub fn add_ms_package_relationship(&mut self, rel_type: &str, target: &str) {
        self.add(SCHEMA_MS, rel_type, target, None);
    }

    pub fn add_worksheet_relationship(
        &mut self,
        rel_type: &str,
        target: &str,
        target_mode: Option<&str>,
    ) {
        self.add(SCHEMA_DOCUMENT, rel_type, target, target_mode);
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn assemble_xml_file(&self) -> Vec<u8> {
        let mut writer = XmlWriter::with_capacity(256 + self.relationships.len() * 160);
        writer.declaration();
        writer.start_tag("Relationships", &[Attr::str("xmlns", SCHEMA_PACKAGE)]);

        for (index, rel) in self.relationships.iter().enumerate() {
            let mut attrs = vec![
                Attr::str("Id", format!("rId{}", index + 1)),
                Attr::str("Type", rel.rel_type.as_str()),
                Attr::str("Target", rel.target.as_str()),
            ];
            if let Some(mode) = &rel.target_mode {
                attrs.push(Attr::str("TargetMode", mode.as_str()));
            }
            writer.empty_tag("Relationship", &attrs);
        }

        writer.end_tag("Relationships");
        writer.into_bytes()
    }
}

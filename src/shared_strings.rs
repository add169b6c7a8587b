use std::collections::HashMap;

use crate::xml::{escape_control_characters, Attr, XmlWriter};

/// Workbook-wide shared string table.
///
/// Ids are handed out in first-seen order and never change; `order` keeps
/// that sequence for serialization while `lookup` answers by content.
#[derive(Debug, Default)]
pub struct SharedStringTable {
    lookup: HashMap<String, u32>,
    order: Vec<String>,
    string_count: u32,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `s`, inserting it on first sight. Every call counts as one
    /// reference.
    pub fn get_or_insert(&mut self, s: &str) -> u32 {
        self.string_count += 1;

        if let Some(&index) = self.lookup.get(s) {
            return index;
        }

        let index = self.order.len() as u32;
        self.order.push(s.to_string());
        self.lookup.insert(s.to_string(), index);
        index
    }

    /// String stored under `index`, if any.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.order.get(index as usize).map(String::as_str)
    }

    pub fn string_count(&self) -> u32 {
        self.string_count
    }

    pub fn unique_count(&self) -> u32 {
        self.order.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.string_count == 0
    }

    /// Render `xl/sharedStrings.xml`.
    pub fn assemble_xml_file(&self) -> Vec<u8> {
        let mut writer = XmlWriter::with_capacity(256 + self.order.len() * 32);
        writer.declaration();
        writer.start_tag(
            "sst",
            &[
                Attr::str("xmlns", "http://schemas.openxmlformats.org/spreadsheetml/2006/main"),
                Attr::int("count", self.string_count),
                Attr::int("uniqueCount", self.unique_count()),
            ],
        );

        for s in &self.order {
            writer.start_tag("si", &[]);
            let text = escape_control_characters(s);
            if needs_space_preserve(&text) {
                writer.data_element("t", &text, &[Attr::str("xml:space", "preserve")]);
            } else {
                writer.data_element("t", &text, &[]);
            }
            writer.end_tag("si");
        }

        writer.end_tag("sst");
        writer.into_bytes()
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r')
}

/// Leading or trailing whitespace must be flagged or Excel strips it.
pub(crate) fn needs_space_preserve(s: &str) -> bool {
    let bytes = s.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last)) => is_space(first) || is_space(last),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_first_sight() {
        let mut sst = SharedStringTable::new();
        assert_eq!(sst.get_or_insert("neptune"), 0);
        assert_eq!(sst.get_or_insert("mars"), 1);
        assert_eq!(sst.get_or_insert("neptune"), 0);
        assert_eq!(sst.get_or_insert("venus"), 2);

        assert_eq!(sst.string_count(), 4);
        assert_eq!(sst.unique_count(), 3);
        assert_eq!(sst.get(1), Some("mars"));
        assert_eq!(sst.get(9), None);
    }

    #[test]
    fn test_repeats_only_bump_string_count() {
        let mut sst = SharedStringTable::new();
        for _ in 0..10 {
            sst.get_or_insert("same");
        }
        assert_eq!(sst.string_count(), 10);
        assert_eq!(sst.unique_count(), 1);
    }

    #[test]
    fn test_assemble_xml() {
        let mut sst = SharedStringTable::new();
        sst.get_or_insert("neptune");
        sst.get_or_insert(" padded ");
        sst.get_or_insert("a<b\u{01}");
        sst.get_or_insert("neptune");

        let xml = String::from_utf8(sst.assemble_xml_file()).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"4\" uniqueCount=\"3\">\
             <si><t>neptune</t></si>\
             <si><t xml:space=\"preserve\"> padded </t></si>\
             <si><t>a&lt;b_x0001_</t></si>\
             </sst>"
        );
    }

    #[test]
    fn test_space_preserve_detection() {
        assert!(needs_space_preserve(" a"));
        assert!(needs_space_preserve("a\n"));
        assert!(!needs_space_preserve("a b"));
        assert!(!needs_space_preserve(""));
    }
}

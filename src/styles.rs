use std::collections::HashMap;

use crate::format::{
    BorderKey, BorderStyle, DiagonalType, FillKey, FontKey, Format, HorizontalAlignment,
    Pattern, VerticalAlignment, XfKey, DEFAULT_FONT_NAME, DEFAULT_FONT_THEME,
};
use crate::xml::{Attr, XmlWriter};

const FIRST_CUSTOM_NUM_FORMAT: u16 = 164;

/// Handle to a format registered with the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatId(pub(crate) usize);

/// One `<xf>` record: the representative format plus its pool indices,
/// filled in by `prepare`.
#[derive(Debug, Clone)]
struct CellXfEntry {
    format: Format,
    font_index: u16,
    has_font: bool,
    fill_index: u16,
    has_fill: bool,
    border_index: u16,
    has_border: bool,
    num_format_index: u16,
    has_num_format: bool,
}

impl CellXfEntry {
    fn new(format: Format) -> Self {
        Self {
            format,
            font_index: 0,
            has_font: false,
            fill_index: 0,
            has_fill: false,
            border_index: 0,
            has_border: false,
            num_format_index: 0,
            has_num_format: false,
        }
    }
}

/// Workbook-wide format arena and xf dedup table.
///
/// Formats are registered up front; an xf index is only allocated the first
/// time a format is actually used by a cell, row or column, so unused formats
/// never reach styles.xml.
#[derive(Debug)]
pub struct StyleRegistry {
    formats: Vec<Format>,
    xf_indices: Vec<Option<u32>>,
    xf_lookup: HashMap<XfKey, u32>,
    cell_xfs: Vec<CellXfEntry>,
    font_count: u16,
    fill_count: u16,
    border_count: u16,
    num_format_count: u16,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    /// The default cell format is registered first and always owns xf 0.
    pub fn new() -> Self {
        let mut registry = Self {
            formats: Vec::new(),
            xf_indices: Vec::new(),
            xf_lookup: HashMap::new(),
            cell_xfs: Vec::new(),
            font_count: 0,
            fill_count: 0,
            border_count: 0,
            num_format_count: 0,
        };
        let default = registry.register_format(Format::default());
        registry.get_xf_index(default);
        registry
    }

    pub fn register_format(&mut self, format: Format) -> FormatId {
        self.formats.push(format);
        self.xf_indices.push(None);
        FormatId(self.formats.len() - 1)
    }

    pub fn default_format(&self) -> FormatId {
        FormatId(0)
    }

    pub fn format(&self, id: FormatId) -> Option<&Format> {
        self.formats.get(id.0)
    }

    pub fn format_count(&self) -> usize {
        self.formats.len()
    }

    /// Memoized xf index for a registered format. Formats with identical
    /// field values resolve to the same index no matter how often or in
    /// which order they are asked for. Unknown handles map to the default.
    pub fn get_xf_index(&mut self, id: FormatId) -> u32 {
        let Some(format) = self.formats.get(id.0) else {
            return 0;
        };

        if let Some(index) = self.xf_indices[id.0] {
            return index;
        }

        let key = format.xf_key();
        let index = match self.xf_lookup.get(&key) {
            Some(&existing) => existing,
            None => {
                let index = self.cell_xfs.len() as u32;
                self.cell_xfs.push(CellXfEntry::new(format.clone()));
                self.xf_lookup.insert(key, index);
                index
            }
        };

        self.xf_indices[id.0] = Some(index);
        index
    }

    pub fn xf_count(&self) -> usize {
        self.cell_xfs.len()
    }

    pub fn font_count(&self) -> u16 {
        self.font_count
    }

    pub fn fill_count(&self) -> u16 {
        self.fill_count
    }

    pub fn border_count(&self) -> u16 {
        self.border_count
    }

    pub fn num_format_count(&self) -> u16 {
        self.num_format_count
    }

    /// Assign font, number format, border and fill pool indices to every
    /// used xf. Must run after the last `get_xf_index` call.
    pub fn prepare(&mut self) {
        self.prepare_fonts();
        self.prepare_num_formats();
        self.prepare_borders();
        self.prepare_fills();
    }

    fn prepare_fonts(&mut self) {
        let mut fonts: HashMap<FontKey, u16> = HashMap::new();
        let mut index = 0u16;

        for xf in &mut self.cell_xfs {
            let key = xf.format.font_key();
            match fonts.get(&key) {
                Some(&existing) => {
                    xf.font_index = existing;
                    xf.has_font = false;
                }
                None => {
                    fonts.insert(key, index);
                    xf.font_index = index;
                    xf.has_font = true;
                    index += 1;
                }
            }
        }
        self.font_count = index;
    }

    fn prepare_num_formats(&mut self) {
        let mut num_formats: HashMap<String, u16> = HashMap::new();
        let mut index = FIRST_CUSTOM_NUM_FORMAT;
        let mut count = 0u16;

        for xf in &mut self.cell_xfs {
            xf.has_num_format = false;

            if xf.format.num_format_index != 0 {
                xf.num_format_index = xf.format.num_format_index as u16;
                continue;
            }

            let num_format = xf.format.num_format.as_str();
            if num_format.is_empty() || num_format.eq_ignore_ascii_case("general") {
                xf.num_format_index = 0;
                continue;
            }

            match num_formats.get(num_format) {
                Some(&existing) => xf.num_format_index = existing,
                None => {
                    num_formats.insert(num_format.to_string(), index);
                    xf.num_format_index = index;
                    xf.has_num_format = true;
                    index += 1;
                    count += 1;
                }
            }
        }
        self.num_format_count = count;
    }

    fn prepare_borders(&mut self) {
        let mut borders: HashMap<BorderKey, u16> = HashMap::new();
        let mut index = 0u16;

        for xf in &mut self.cell_xfs {
            let key = xf.format.border_key();
            match borders.get(&key) {
                Some(&existing) => {
                    xf.border_index = existing;
                    xf.has_border = false;
                }
                None => {
                    borders.insert(key, index);
                    xf.border_index = index;
                    xf.has_border = true;
                    index += 1;
                }
            }
        }
        self.border_count = index;
    }

    fn prepare_fills(&mut self) {
        let mut fills: HashMap<FillKey, u16> = HashMap::new();
        fills.insert(FillKey { pattern: Pattern::None, fg_color: None, bg_color: None }, 0);
        fills.insert(FillKey { pattern: Pattern::Gray125, fg_color: None, bg_color: None }, 1);
        let mut index = 2u16;

        for xf in &mut self.cell_xfs {
            xf.format.normalize_fill();

            let key = xf.format.fill_key();
            match fills.get(&key) {
                Some(&existing) => {
                    xf.fill_index = existing;
                    xf.has_fill = false;
                }
                None => {
                    fills.insert(key, index);
                    xf.fill_index = index;
                    xf.has_fill = true;
                    index += 1;
                }
            }
        }
        self.fill_count = index;
    }

    /// Render `xl/styles.xml`. Call `prepare` first.
    pub fn assemble_xml_file(&self) -> Vec<u8> {
        let mut writer = XmlWriter::with_capacity(2048 + self.cell_xfs.len() * 256);
        writer.declaration();
        writer.start_tag(
            "styleSheet",
            &[Attr::str("xmlns", "http://schemas.openxmlformats.org/spreadsheetml/2006/main")],
        );

        self.write_num_fmts(&mut writer);
        self.write_fonts(&mut writer);
        self.write_fills(&mut writer);
        self.write_borders(&mut writer);

        writer.start_tag("cellStyleXfs", &[Attr::int("count", 1)]);
        writer.empty_tag(
            "xf",
            &[
                Attr::str("numFmtId", "0"),
                Attr::str("fontId", "0"),
                Attr::str("fillId", "0"),
                Attr::str("borderId", "0"),
            ],
        );
        writer.end_tag("cellStyleXfs");

        writer.start_tag("cellXfs", &[Attr::int("count", self.cell_xfs.len() as i64)]);
        for xf in &self.cell_xfs {
            write_xf(&mut writer, xf);
        }
        writer.end_tag("cellXfs");

        writer.start_tag("cellStyles", &[Attr::int("count", 1)]);
        writer.empty_tag(
            "cellStyle",
            &[Attr::str("name", "Normal"), Attr::str("xfId", "0"), Attr::str("builtinId", "0")],
        );
        writer.end_tag("cellStyles");

        writer.empty_tag("dxfs", &[Attr::str("count", "0")]);
        writer.empty_tag(
            "tableStyles",
            &[
                Attr::str("count", "0"),
                Attr::str("defaultTableStyle", "TableStyleMedium9"),
                Attr::str("defaultPivotStyle", "PivotStyleLight16"),
            ],
        );

        writer.end_tag("styleSheet");
        writer.into_bytes()
    }

    fn write_num_fmts(&self, writer: &mut XmlWriter) {
        if self.num_format_count == 0 {
            return;
        }

        writer.start_tag("numFmts", &[Attr::int("count", self.num_format_count)]);
        for xf in self.cell_xfs.iter().filter(|xf| xf.has_num_format) {
            writer.empty_tag(
                "numFmt",
                &[
                    Attr::int("numFmtId", xf.num_format_index),
                    Attr::str("formatCode", xf.format.num_format.as_str()),
                ],
            );
        }
        writer.end_tag("numFmts");
    }

    fn write_fonts(&self, writer: &mut XmlWriter) {
        writer.start_tag("fonts", &[Attr::int("count", self.font_count)]);
        for xf in self.cell_xfs.iter().filter(|xf| xf.has_font) {
            write_font(writer, &xf.format);
        }
        writer.end_tag("fonts");
    }

    fn write_fills(&self, writer: &mut XmlWriter) {
        writer.start_tag("fills", &[Attr::int("count", self.fill_count)]);

        for default in ["none", "gray125"] {
            writer.start_tag("fill", &[]);
            writer.empty_tag("patternFill", &[Attr::str("patternType", default)]);
            writer.end_tag("fill");
        }

        for xf in self.cell_xfs.iter().filter(|xf| xf.has_fill) {
            write_fill(writer, &xf.format);
        }
        writer.end_tag("fills");
    }

    fn write_borders(&self, writer: &mut XmlWriter) {
        writer.start_tag("borders", &[Attr::int("count", self.border_count)]);
        for xf in self.cell_xfs.iter().filter(|xf| xf.has_border) {
            write_border(writer, &xf.format);
        }
        writer.end_tag("borders");
    }
}

#[inline]
fn rgb(color: u32) -> String {
    format!("FF{:06X}", color)
}

fn write_font(writer: &mut XmlWriter, format: &Format) {
    writer.start_tag("font", &[]);

    if format.bold {
        writer.empty_tag("b", &[]);
    }
    if format.italic {
        writer.empty_tag("i", &[]);
    }
    if format.font_strikeout {
        writer.empty_tag("strike", &[]);
    }
    if format.font_outline {
        writer.empty_tag("outline", &[]);
    }
    if format.font_shadow {
        writer.empty_tag("shadow", &[]);
    }
    if let Some(underline) = format.underline {
        match underline.xml_val() {
            Some(val) => writer.empty_tag("u", &[Attr::str("val", val)]),
            None => writer.empty_tag("u", &[]),
        }
    }
    match format.font_script {
        Some(crate::format::Script::Superscript) => {
            writer.empty_tag("vertAlign", &[Attr::str("val", "superscript")])
        }
        Some(crate::format::Script::Subscript) => {
            writer.empty_tag("vertAlign", &[Attr::str("val", "subscript")])
        }
        None => {}
    }
    if format.font_size > 0.0 {
        writer.empty_tag("sz", &[Attr::num("val", format.font_size)]);
    }

    if format.theme != 0 {
        writer.empty_tag("color", &[Attr::int("theme", format.theme)]);
    } else if let Some(color) = format.font_color {
        writer.empty_tag("color", &[Attr::str("rgb", rgb(color))]);
    } else {
        writer.empty_tag("color", &[Attr::int("theme", DEFAULT_FONT_THEME)]);
    }

    let name = if format.font_name.is_empty() {
        DEFAULT_FONT_NAME
    } else {
        format.font_name.as_str()
    };
    writer.empty_tag("name", &[Attr::str("val", name)]);
    writer.empty_tag("family", &[Attr::int("val", format.font_family)]);

    // Hyperlink fonts and non-default fonts carry no scheme.
    if name == DEFAULT_FONT_NAME && !format.hyperlink {
        let scheme = if format.font_scheme.is_empty() {
            "minor"
        } else {
            format.font_scheme.as_str()
        };
        writer.empty_tag("scheme", &[Attr::str("val", scheme)]);
    }

    writer.end_tag("font");
}

fn write_fill(writer: &mut XmlWriter, format: &Format) {
    writer.start_tag("fill", &[]);

    if format.pattern != Pattern::None {
        writer.start_tag("patternFill", &[Attr::str("patternType", format.pattern.xml_val())]);
    } else {
        writer.start_tag("patternFill", &[]);
    }

    if let Some(fg) = format.fg_color {
        writer.empty_tag("fgColor", &[Attr::str("rgb", rgb(fg))]);
    }
    match format.bg_color {
        Some(bg) => writer.empty_tag("bgColor", &[Attr::str("rgb", rgb(bg))]),
        None => writer.empty_tag("bgColor", &[Attr::str("indexed", "64")]),
    }

    writer.end_tag("patternFill");
    writer.end_tag("fill");
}

fn write_sub_border(writer: &mut XmlWriter, tag: &str, style: BorderStyle, color: Option<u32>) {
    if style == BorderStyle::None {
        writer.empty_tag(tag, &[]);
        return;
    }

    writer.start_tag(tag, &[Attr::str("style", style.xml_val())]);
    match color {
        Some(color) => writer.empty_tag("color", &[Attr::str("rgb", rgb(color))]),
        None => writer.empty_tag("color", &[Attr::str("auto", "1")]),
    }
    writer.end_tag(tag);
}

fn write_border(writer: &mut XmlWriter, format: &Format) {
    let mut attrs = Vec::with_capacity(2);
    match format.diag_type {
        Some(DiagonalType::Up) => attrs.push(Attr::str("diagonalUp", "1")),
        Some(DiagonalType::Down) => attrs.push(Attr::str("diagonalDown", "1")),
        Some(DiagonalType::UpDown) => {
            attrs.push(Attr::str("diagonalUp", "1"));
            attrs.push(Attr::str("diagonalDown", "1"));
        }
        None => {}
    }

    // A diagonal type without a diagonal style gets a thin line.
    let diag_border = if format.diag_type.is_some() && format.diag_border == BorderStyle::None {
        BorderStyle::Thin
    } else {
        format.diag_border
    };

    writer.start_tag("border", &attrs);
    write_sub_border(writer, "left", format.left, format.left_color);
    write_sub_border(writer, "right", format.right, format.right_color);
    write_sub_border(writer, "top", format.top, format.top_color);
    write_sub_border(writer, "bottom", format.bottom, format.bottom_color);
    write_sub_border(writer, "diagonal", diag_border, format.diag_color);
    writer.end_tag("border");
}

fn write_alignment(writer: &mut XmlWriter, format: &Format) {
    let mut h_align = format.h_align;
    let mut shrink = format.shrink;
    let mut just_distrib = format.text_justlast;

    // Indent only applies to left, right and distributed text.
    if format.indent != 0
        && !matches!(
            h_align,
            HorizontalAlignment::Left | HorizontalAlignment::Right | HorizontalAlignment::Distributed
        )
    {
        h_align = HorizontalAlignment::Left;
    }

    if format.text_wrap
        || matches!(
            h_align,
            HorizontalAlignment::Fill | HorizontalAlignment::Justify | HorizontalAlignment::Distributed
        )
    {
        shrink = false;
    }
    if h_align != HorizontalAlignment::Distributed || format.indent != 0 {
        just_distrib = false;
    }

    let mut attrs = Vec::with_capacity(8);

    let horizontal = match h_align {
        HorizontalAlignment::None => None,
        HorizontalAlignment::Left => Some("left"),
        HorizontalAlignment::Center => Some("center"),
        HorizontalAlignment::Right => Some("right"),
        HorizontalAlignment::Fill => Some("fill"),
        HorizontalAlignment::Justify => Some("justify"),
        HorizontalAlignment::CenterAcross => Some("centerContinuous"),
        HorizontalAlignment::Distributed => Some("distributed"),
    };
    if let Some(horizontal) = horizontal {
        attrs.push(Attr::str("horizontal", horizontal));
    }
    if just_distrib {
        attrs.push(Attr::str("justifyLastLine", "1"));
    }

    let vertical = match format.v_align {
        VerticalAlignment::Top => Some("top"),
        VerticalAlignment::Center => Some("center"),
        VerticalAlignment::Justify => Some("justify"),
        VerticalAlignment::Distributed => Some("distributed"),
        VerticalAlignment::None | VerticalAlignment::Bottom => None,
    };
    if let Some(vertical) = vertical {
        attrs.push(Attr::str("vertical", vertical));
    }

    if format.indent != 0 {
        attrs.push(Attr::int("indent", format.indent));
    }
    if format.rotation != 0 {
        attrs.push(Attr::int("textRotation", format.rotation));
    }
    if format.text_wrap {
        attrs.push(Attr::str("wrapText", "1"));
    }
    if shrink {
        attrs.push(Attr::str("shrinkToFit", "1"));
    }
    match format.reading_order {
        1 => attrs.push(Attr::str("readingOrder", "1")),
        2 => attrs.push(Attr::str("readingOrder", "2")),
        _ => {}
    }

    if !attrs.is_empty() {
        writer.empty_tag("alignment", &attrs);
    }
}

fn write_protection(writer: &mut XmlWriter, format: &Format) {
    let mut attrs = Vec::with_capacity(2);
    if !format.locked {
        attrs.push(Attr::str("locked", "0"));
    }
    if format.hidden {
        attrs.push(Attr::str("hidden", "1"));
    }
    writer.empty_tag("protection", &attrs);
}

fn write_xf(writer: &mut XmlWriter, xf: &CellXfEntry) {
    let format = &xf.format;
    let has_protection = format.has_protection();
    let has_alignment = format.has_alignment();

    let mut attrs = vec![
        Attr::int("numFmtId", xf.num_format_index),
        Attr::int("fontId", xf.font_index),
        Attr::int("fillId", xf.fill_index),
        Attr::int("borderId", xf.border_index),
        Attr::str("xfId", "0"),
    ];

    if xf.num_format_index > 0 {
        attrs.push(Attr::str("applyNumberFormat", "1"));
    }
    if xf.font_index > 0 {
        attrs.push(Attr::str("applyFont", "1"));
    }
    if xf.fill_index > 0 {
        attrs.push(Attr::str("applyFill", "1"));
    }
    if xf.border_index > 0 {
        attrs.push(Attr::str("applyBorder", "1"));
    }
    if format.apply_alignment() {
        attrs.push(Attr::str("applyAlignment", "1"));
    }
    if has_protection {
        attrs.push(Attr::str("applyProtection", "1"));
    }

    if has_alignment || has_protection {
        writer.start_tag("xf", &attrs);
        if has_alignment {
            write_alignment(writer, format);
        }
        if has_protection {
            write_protection(writer, format);
        }
        writer.end_tag("xf");
    } else {
        writer.empty_tag("xf", &attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{COLOR_BLUE, COLOR_RED};

    fn styles_xml(registry: &mut StyleRegistry) -> String {
        registry.prepare();
        String::from_utf8(registry.assemble_xml_file()).unwrap()
    }

    #[test]
    fn test_default_format_is_xf_zero() {
        let mut registry = StyleRegistry::new();
        assert_eq!(registry.get_xf_index(registry.default_format()), 0);
        assert_eq!(registry.xf_count(), 1);
    }

    #[test]
    fn test_equal_formats_share_index() {
        let mut registry = StyleRegistry::new();
        let a = registry.register_format(Format::new().set_bold().set_italic());
        let b = registry.register_format(Format::new().set_italic().set_bold());
        let c = registry.register_format(Format::new().set_bold());

        assert_eq!(registry.get_xf_index(a), 1);
        assert_eq!(registry.get_xf_index(b), 1);
        assert_eq!(registry.get_xf_index(c), 2);
        assert_eq!(registry.get_xf_index(a), 1);
        assert_eq!(registry.xf_count(), 3);
    }

    #[test]
    fn test_index_order_follows_first_use() {
        let mut registry = StyleRegistry::new();
        let a = registry.register_format(Format::new().set_bold());
        let b = registry.register_format(Format::new().set_italic());
        assert_eq!(registry.get_xf_index(b), 1);
        assert_eq!(registry.get_xf_index(a), 2);
    }

    #[test]
    fn test_unused_formats_not_counted() {
        let mut registry = StyleRegistry::new();
        registry.register_format(Format::new().set_bold());
        assert_eq!(registry.format_count(), 2);
        assert_eq!(registry.xf_count(), 1);
    }

    #[test]
    fn test_default_styles_xml() {
        let mut registry = StyleRegistry::new();
        let xml = styles_xml(&mut registry);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n"));
        assert!(!xml.contains("<numFmts"));
        assert!(xml.contains(
            "<fonts count=\"1\"><font><sz val=\"11\"/><color theme=\"1\"/><name val=\"Calibri\"/><family val=\"2\"/><scheme val=\"minor\"/></font></fonts>"
        ));
        assert!(xml.contains(
            "<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill></fills>"
        ));
        assert!(xml.contains(
            "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"
        ));
        assert!(xml.contains(
            "<cellXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/></cellXfs>"
        ));
        assert!(xml.ends_with("</styleSheet>"));
    }

    #[test]
    fn test_bg_only_fill_becomes_solid_fg() {
        let mut registry = StyleRegistry::new();
        let id = registry.register_format(Format::new().set_bg_color(COLOR_RED));
        registry.get_xf_index(id);
        let xml = styles_xml(&mut registry);

        assert!(xml.contains(
            "<fill><patternFill patternType=\"solid\"><fgColor rgb=\"FFFF0000\"/><bgColor indexed=\"64\"/></patternFill></fill>"
        ));
        assert!(xml.contains("fillId=\"2\" borderId=\"0\" xfId=\"0\" applyFill=\"1\"/>"));
        assert_eq!(registry.fill_count(), 3);
    }

    #[test]
    fn test_custom_num_formats_start_at_164() {
        let mut registry = StyleRegistry::new();
        let a = registry.register_format(Format::new().set_num_format("0.000"));
        let b = registry.register_format(Format::new().set_num_format("0.000").set_bold());
        let c = registry.register_format(Format::new().set_num_format("d mmm yyyy"));
        let d = registry.register_format(Format::new().set_num_format_index(14));
        let e = registry.register_format(Format::new().set_num_format("General").set_italic());
        for id in [a, b, c, d, e] {
            registry.get_xf_index(id);
        }
        let xml = styles_xml(&mut registry);

        assert_eq!(registry.num_format_count(), 2);
        assert!(xml.contains(
            "<numFmts count=\"2\"><numFmt numFmtId=\"164\" formatCode=\"0.000\"/><numFmt numFmtId=\"165\" formatCode=\"d mmm yyyy\"/></numFmts>"
        ));
        assert!(xml.contains("<xf numFmtId=\"14\" fontId=\"0\""));
        assert!(!xml.contains("formatCode=\"General\""));
    }

    #[test]
    fn test_fonts_pooled_separately() {
        let mut registry = StyleRegistry::new();
        let a = registry.register_format(Format::new().set_bold().set_border(BorderStyle::Thin));
        let b = registry.register_format(Format::new().set_bold());
        let c = registry.register_format(Format::new().set_font_color(COLOR_BLUE).set_font_name("Arial"));
        for id in [a, b, c] {
            registry.get_xf_index(id);
        }
        let xml = styles_xml(&mut registry);

        assert_eq!(registry.font_count(), 3);
        assert_eq!(registry.border_count(), 2);
        assert!(xml.contains(
            "<font><sz val=\"11\"/><color rgb=\"FF0000FF\"/><name val=\"Arial\"/><family val=\"2\"/></font>"
        ));
        assert!(xml.contains(
            "<border><left style=\"thin\"><color auto=\"1\"/></left><right style=\"thin\"><color auto=\"1\"/></right><top style=\"thin\"><color auto=\"1\"/></top><bottom style=\"thin\"><color auto=\"1\"/></bottom><diagonal/></border>"
        ));
    }

    #[test]
    fn test_alignment_and_protection_xf() {
        let mut registry = StyleRegistry::new();
        let id = registry.register_format(
            Format::new()
                .set_align(HorizontalAlignment::Center)
                .set_valign(VerticalAlignment::Top)
                .set_text_wrap()
                .set_unlocked(),
        );
        registry.get_xf_index(id);
        let xml = styles_xml(&mut registry);

        assert!(xml.contains(
            "<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyAlignment=\"1\" applyProtection=\"1\"><alignment horizontal=\"center\" vertical=\"top\" wrapText=\"1\"/><protection locked=\"0\"/></xf>"
        ));
    }

    #[test]
    fn test_indent_forces_left_alignment() {
        let mut registry = StyleRegistry::new();
        let id = registry.register_format(Format::new().set_indent(2));
        registry.get_xf_index(id);
        let xml = styles_xml(&mut registry);
        assert!(xml.contains("<alignment horizontal=\"left\" indent=\"2\"/>"));
    }

    #[test]
    fn test_diagonal_border_defaults_to_thin() {
        let mut registry = StyleRegistry::new();
        let id = registry.register_format(Format::new().set_diag_type(DiagonalType::UpDown));
        registry.get_xf_index(id);
        let xml = styles_xml(&mut registry);
        assert!(xml.contains(
            "<border diagonalUp=\"1\" diagonalDown=\"1\"><left/><right/><top/><bottom/><diagonal style=\"thin\"><color auto=\"1\"/></diagonal></border>"
        ));
    }
}

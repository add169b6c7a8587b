use crate::xml::{Attr, XmlWriter};

const SCHEMA_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006";
const SCHEMA_OFFICEDOC_RELS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorType {
    Image,
    Chart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorEditAs {
    #[default]
    OneCell,
    Absolute,
    Relative,
}

/// One corner of a two-cell anchor. Offsets are in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawingCoords {
    pub col: u32,
    pub row: u32,
    pub col_offset: f64,
    pub row_offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawingObject {
    pub anchor_type: AnchorType,
    pub edit_as: AnchorEditAs,
    pub from: DrawingCoords,
    pub to: DrawingCoords,
    pub col_absolute: u64,
    pub row_absolute: u64,
    pub width: u32,
    pub height: u32,
    pub description: String,
}

/// `xl/drawings/drawingN.xml` for one worksheet. Object `n` (1-based) is
/// linked through `rIdn` of the drawing's own rels part.
#[derive(Debug, Default)]
pub struct Drawing {
    pub(crate) objects: Vec<DrawingObject>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, object: DrawingObject) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn assemble_xml_file(&self) -> Vec<u8> {
        let mut writer = XmlWriter::with_capacity(512 + self.objects.len() * 1024);
        writer.declaration();
        writer.start_tag(
            "xdr:wsDr",
            &[
                Attr::str("xmlns:xdr", format!("{}/spreadsheetDrawing", SCHEMA_DRAWING)),
                Attr::str("xmlns:a", format!("{}/main", SCHEMA_DRAWING)),
            ],
        );

        for (index, object) in self.objects.iter().enumerate() {
            write_two_cell_anchor(&mut writer, index as u32 + 1, object);
        }

        writer.end_tag("xdr:wsDr");
        writer.into_bytes()
    }
}

fn write_coords(writer: &mut XmlWriter, tag: &str, coords: &DrawingCoords) {
    writer.start_tag(tag, &[]);
    writer.data_element("xdr:col", itoa::Buffer::new().format(coords.col), &[]);
    writer.data_element("xdr:colOff", itoa::Buffer::new().format(coords.col_offset as u32), &[]);
    writer.data_element("xdr:row", itoa::Buffer::new().format(coords.row), &[]);
    writer.data_element("xdr:rowOff", itoa::Buffer::new().format(coords.row_offset as u32), &[]);
    writer.end_tag(tag);
}

fn write_c_nv_pr(writer: &mut XmlWriter, object_name: &str, index: u32, descr: Option<&str>) {
    let mut attrs = vec![
        Attr::int("id", index + 1),
        Attr::str("name", format!("{} {}", object_name, index)),
    ];
    if let Some(descr) = descr {
        attrs.push(Attr::str("descr", descr));
    }
    writer.empty_tag("xdr:cNvPr", &attrs);
}

fn write_pic(writer: &mut XmlWriter, index: u32, object: &DrawingObject) {
    writer.start_tag("xdr:pic", &[]);

    writer.start_tag("xdr:nvPicPr", &[]);
    write_c_nv_pr(writer, "Picture", index, Some(&object.description));
    writer.start_tag("xdr:cNvPicPr", &[]);
    writer.empty_tag("a:picLocks", &[Attr::str("noChangeAspect", "1")]);
    writer.end_tag("xdr:cNvPicPr");
    writer.end_tag("xdr:nvPicPr");

    writer.start_tag("xdr:blipFill", &[]);
    writer.empty_tag(
        "a:blip",
        &[
            Attr::str("xmlns:r", SCHEMA_OFFICEDOC_RELS),
            Attr::str("r:embed", format!("rId{}", index)),
        ],
    );
    writer.start_tag("a:stretch", &[]);
    writer.empty_tag("a:fillRect", &[]);
    writer.end_tag("a:stretch");
    writer.end_tag("xdr:blipFill");

    writer.start_tag("xdr:spPr", &[]);
    writer.start_tag("a:xfrm", &[]);
    writer.empty_tag(
        "a:off",
        &[
            Attr::int("x", object.col_absolute as i64),
            Attr::int("y", object.row_absolute as i64),
        ],
    );
    writer.empty_tag("a:ext", &[Attr::int("cx", object.width), Attr::int("cy", object.height)]);
    writer.end_tag("a:xfrm");
    writer.start_tag("a:prstGeom", &[Attr::str("prst", "rect")]);
    writer.empty_tag("a:avLst", &[]);
    writer.end_tag("a:prstGeom");
    writer.end_tag("xdr:spPr");

    writer.end_tag("xdr:pic");
}

fn write_graphic_frame(writer: &mut XmlWriter, index: u32) {
    writer.start_tag("xdr:graphicFrame", &[Attr::str("macro", "")]);

    writer.start_tag("xdr:nvGraphicFramePr", &[]);
    write_c_nv_pr(writer, "Chart", index, None);
    writer.empty_tag("xdr:cNvGraphicFramePr", &[]);
    writer.end_tag("xdr:nvGraphicFramePr");

    writer.start_tag("xdr:xfrm", &[]);
    writer.empty_tag("a:off", &[Attr::str("x", "0"), Attr::str("y", "0")]);
    writer.empty_tag("a:ext", &[Attr::str("cx", "0"), Attr::str("cy", "0")]);
    writer.end_tag("xdr:xfrm");

    writer.start_tag("a:graphic", &[]);
    writer.start_tag("a:graphicData", &[Attr::str("uri", format!("{}/chart", SCHEMA_DRAWING))]);
    writer.empty_tag(
        "c:chart",
        &[
            Attr::str("xmlns:c", format!("{}/chart", SCHEMA_DRAWING)),
            Attr::str("xmlns:r", SCHEMA_OFFICEDOC_RELS),
            Attr::str("r:id", format!("rId{}", index)),
        ],
    );
    writer.end_tag("a:graphicData");
    writer.end_tag("a:graphic");

    writer.end_tag("xdr:graphicFrame");
}

fn write_two_cell_anchor(writer: &mut XmlWriter, index: u32, object: &DrawingObject) {
    let mut attrs = Vec::new();
    if object.anchor_type == AnchorType::Image {
        match object.edit_as {
            AnchorEditAs::Absolute => attrs.push(Attr::str("editAs", "absolute")),
            AnchorEditAs::OneCell => attrs.push(Attr::str("editAs", "oneCell")),
            AnchorEditAs::Relative => {}
        }
    }
    writer.start_tag("xdr:twoCellAnchor", &attrs);

    write_coords(writer, "xdr:from", &object.from);
    write_coords(writer, "xdr:to", &object.to);

    match object.anchor_type {
        AnchorType::Chart => write_graphic_frame(writer, index),
        AnchorType::Image => write_pic(writer, index, object),
    }

    writer.empty_tag("xdr:clientData", &[]);
    writer.end_tag("xdr:twoCellAnchor");
}

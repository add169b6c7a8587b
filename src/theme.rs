use crate::xml::{Attr, XmlWriter};

const SCHEMA_DRAWING_MAIN: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// Scheme colors of the Office 2007 theme, the one Calibri 11 cell defaults
/// are measured against.
const COLOR_SCHEME: [(&str, ColorSource); 12] = [
    ("dk1", ColorSource::System("windowText", "000000")),
    ("lt1", ColorSource::System("window", "FFFFFF")),
    ("dk2", ColorSource::Rgb("1F497D")),
    ("lt2", ColorSource::Rgb("EEECE1")),
    ("accent1", ColorSource::Rgb("4F81BD")),
    ("accent2", ColorSource::Rgb("C0504D")),
    ("accent3", ColorSource::Rgb("9BBB59")),
    ("accent4", ColorSource::Rgb("8064A2")),
    ("accent5", ColorSource::Rgb("4BACC6")),
    ("accent6", ColorSource::Rgb("F79646")),
    ("hlink", ColorSource::Rgb("0000FF")),
    ("folHlink", ColorSource::Rgb("800080")),
];

const MAJOR_FONT: &str = "Cambria";
const MINOR_FONT: &str = "Calibri";

// Fill, line, effect and background styles are fixed; Excel never edits them.
const FORMAT_SCHEME: &str = concat!(
    r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="50000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="35000"><a:schemeClr val="phClr"><a:tint val="37000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:tint val="15000"/><a:satMod val="350000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="16200000" scaled="1"/></a:gradFill>"#,
    r#"<a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:shade val="51000"/><a:satMod val="130000"/></a:schemeClr></a:gs><a:gs pos="80000"><a:schemeClr val="phClr"><a:shade val="93000"/><a:satMod val="130000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="94000"/><a:satMod val="135000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="16200000" scaled="0"/></a:gradFill>"#,
    r#"</a:fillStyleLst><a:lnStyleLst>"#,
    r#"<a:ln w="9525" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"><a:shade val="95000"/><a:satMod val="105000"/></a:schemeClr></a:solidFill><a:prstDash val="solid"/></a:ln>"#,
    r#"<a:ln w="25400" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln>"#,
    r#"<a:ln w="38100" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln>"#,
    r#"</a:lnStyleLst><a:effectStyleLst>"#,
    r#"<a:effectStyle><a:effectLst><a:outerShdw blurRad="40000" dist="20000" dir="5400000" rotWithShape="0"><a:srgbClr val="000000"><a:alpha val="38000"/></a:srgbClr></a:outerShdw></a:effectLst></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst><a:outerShdw blurRad="40000" dist="23000" dir="5400000" rotWithShape="0"><a:srgbClr val="000000"><a:alpha val="35000"/></a:srgbClr></a:outerShdw></a:effectLst></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst><a:outerShdw blurRad="40000" dist="23000" dir="5400000" rotWithShape="0"><a:srgbClr val="000000"><a:alpha val="35000"/></a:srgbClr></a:outerShdw></a:effectLst><a:scene3d><a:camera prst="orthographicFront"><a:rot lat="0" lon="0" rev="0"/></a:camera><a:lightRig rig="threePt" dir="t"><a:rot lat="0" lon="0" rev="1200000"/></a:lightRig></a:scene3d><a:sp3d><a:bevelT w="63500" h="25400"/></a:sp3d></a:effectStyle>"#,
    r#"</a:effectStyleLst><a:bgFillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="40000"/><a:satMod val="350000"/></a:schemeClr></a:gs><a:gs pos="40000"><a:schemeClr val="phClr"><a:tint val="45000"/><a:shade val="99000"/><a:satMod val="350000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="20000"/><a:satMod val="255000"/></a:schemeClr></a:gs></a:gsLst><a:path path="circle"><a:fillToRect l="50000" t="-80000" r="50000" b="180000"/></a:path></a:gradFill>"#,
    r#"<a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="80000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="30000"/><a:satMod val="200000"/></a:schemeClr></a:gs></a:gsLst><a:path path="circle"><a:fillToRect l="50000" t="50000" r="50000" b="50000"/></a:path></a:gradFill>"#,
    r#"</a:bgFillStyleLst></a:fmtScheme>"#,
);

#[derive(Debug, Clone, Copy)]
enum ColorSource {
    /// System color with the value Excel caches for it.
    System(&'static str, &'static str),
    Rgb(&'static str),
}

/// `xl/theme/theme1.xml`.
pub fn assemble_xml_file() -> Vec<u8> {
    let mut writer = XmlWriter::with_capacity(8192);
    writer.declaration();
    writer.start_tag(
        "a:theme",
        &[Attr::str("xmlns:a", SCHEMA_DRAWING_MAIN), Attr::str("name", "Office Theme")],
    );
    writer.start_tag("a:themeElements", &[]);

    writer.start_tag("a:clrScheme", &[Attr::str("name", "Office")]);
    for (slot, source) in COLOR_SCHEME {
        let tag = format!("a:{}", slot);
        writer.start_tag(&tag, &[]);
        match source {
            ColorSource::System(name, last) => writer.empty_tag(
                "a:sysClr",
                &[Attr::str("val", name), Attr::str("lastClr", last)],
            ),
            ColorSource::Rgb(rgb) => writer.empty_tag("a:srgbClr", &[Attr::str("val", rgb)]),
        }
        writer.end_tag(&tag);
    }
    writer.end_tag("a:clrScheme");

    writer.start_tag("a:fontScheme", &[Attr::str("name", "Office")]);
    for (tag, typeface) in [("a:majorFont", MAJOR_FONT), ("a:minorFont", MINOR_FONT)] {
        writer.start_tag(tag, &[]);
        writer.empty_tag("a:latin", &[Attr::str("typeface", typeface)]);
        writer.empty_tag("a:ea", &[Attr::str("typeface", "")]);
        writer.empty_tag("a:cs", &[Attr::str("typeface", "")]);
        writer.end_tag(tag);
    }
    writer.end_tag("a:fontScheme");

    writer.raw(FORMAT_SCHEME.as_bytes());
    writer.end_tag("a:themeElements");

    writer.empty_tag("a:objectDefaults", &[]);
    writer.empty_tag("a:extraClrSchemeLst", &[]);
    writer.end_tag("a:theme");
    writer.into_bytes()
}

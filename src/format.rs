pub const DEFAULT_FONT_NAME: &str = "Calibri";
pub const DEFAULT_FONT_FAMILY: u8 = 2;
pub const DEFAULT_FONT_THEME: u8 = 1;
pub const COLOR_MASK: u32 = 0xFF_FFFF;

pub const COLOR_BLACK: u32 = 0x100_0000;
pub const COLOR_BLUE: u32 = 0x00_00FF;
pub const COLOR_BROWN: u32 = 0x80_0000;
pub const COLOR_CYAN: u32 = 0x00_FFFF;
pub const COLOR_GRAY: u32 = 0x80_8080;
pub const COLOR_GREEN: u32 = 0x00_8000;
pub const COLOR_LIME: u32 = 0x00_FF00;
pub const COLOR_MAGENTA: u32 = 0xFF_00FF;
pub const COLOR_NAVY: u32 = 0x00_0080;
pub const COLOR_ORANGE: u32 = 0xFF_6600;
pub const COLOR_PINK: u32 = 0xFF_00FF;
pub const COLOR_PURPLE: u32 = 0x80_0080;
pub const COLOR_RED: u32 = 0xFF_0000;
pub const COLOR_SILVER: u32 = 0xC0_C0C0;
pub const COLOR_WHITE: u32 = 0xFF_FFFF;
pub const COLOR_YELLOW: u32 = 0xFF_FF00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Underline {
    Single = 1,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

impl Underline {
    pub(crate) fn xml_val(self) -> Option<&'static str> {
        match self {
            Underline::Single => None,
            Underline::Double => Some("double"),
            Underline::SingleAccounting => Some("singleAccounting"),
            Underline::DoubleAccounting => Some("doubleAccounting"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Superscript = 1,
    Subscript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    None,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterAcross,
    Distributed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    None,
    Top,
    Bottom,
    Center,
    Justify,
    Distributed,
}

/// Cell fill patterns, in the order Excel numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Pattern {
    #[default]
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray125,
    Gray0625,
}

impl Pattern {
    pub(crate) fn xml_val(self) -> &'static str {
        match self {
            Pattern::None => "none",
            Pattern::Solid => "solid",
            Pattern::MediumGray => "mediumGray",
            Pattern::DarkGray => "darkGray",
            Pattern::LightGray => "lightGray",
            Pattern::DarkHorizontal => "darkHorizontal",
            Pattern::DarkVertical => "darkVertical",
            Pattern::DarkDown => "darkDown",
            Pattern::DarkUp => "darkUp",
            Pattern::DarkGrid => "darkGrid",
            Pattern::DarkTrellis => "darkTrellis",
            Pattern::LightHorizontal => "lightHorizontal",
            Pattern::LightVertical => "lightVertical",
            Pattern::LightDown => "lightDown",
            Pattern::LightUp => "lightUp",
            Pattern::LightGrid => "lightGrid",
            Pattern::LightTrellis => "lightTrellis",
            Pattern::Gray125 => "gray125",
            Pattern::Gray0625 => "gray0625",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderStyle {
    pub(crate) fn xml_val(self) -> &'static str {
        match self {
            BorderStyle::None => "none",
            BorderStyle::Thin => "thin",
            BorderStyle::Medium => "medium",
            BorderStyle::Dashed => "dashed",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Thick => "thick",
            BorderStyle::Double => "double",
            BorderStyle::Hair => "hair",
            BorderStyle::MediumDashed => "mediumDashed",
            BorderStyle::DashDot => "dashDot",
            BorderStyle::MediumDashDot => "mediumDashDot",
            BorderStyle::DashDotDot => "dashDotDot",
            BorderStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderStyle::SlantDashDot => "slantDashDot",
        }
    }

    /// Map a raw Excel border index, treating anything unknown as no border.
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => BorderStyle::Thin,
            2 => BorderStyle::Medium,
            3 => BorderStyle::Dashed,
            4 => BorderStyle::Dotted,
            5 => BorderStyle::Thick,
            6 => BorderStyle::Double,
            7 => BorderStyle::Hair,
            8 => BorderStyle::MediumDashed,
            9 => BorderStyle::DashDot,
            10 => BorderStyle::MediumDashDot,
            11 => BorderStyle::DashDotDot,
            12 => BorderStyle::MediumDashDotDot,
            13 => BorderStyle::SlantDashDot,
            _ => BorderStyle::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagonalType {
    Up = 1,
    Down,
    UpDown,
}

#[inline]
fn check_color(color: u32) -> u32 {
    color & COLOR_MASK
}

/// Font fields only. Fonts are pooled separately in styles.xml.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FontKey {
    name: String,
    size_bits: u64,
    bold: bool,
    italic: bool,
    color: Option<u32>,
    underline: Option<Underline>,
    strikeout: bool,
    outline: bool,
    shadow: bool,
    script: Option<Script>,
    family: u8,
    charset: u8,
    condense: bool,
    extend: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BorderKey {
    bottom: BorderStyle,
    left: BorderStyle,
    right: BorderStyle,
    top: BorderStyle,
    diag_border: BorderStyle,
    diag_type: Option<DiagonalType>,
    bottom_color: Option<u32>,
    left_color: Option<u32>,
    right_color: Option<u32>,
    top_color: Option<u32>,
    diag_color: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FillKey {
    pub(crate) pattern: Pattern,
    pub(crate) fg_color: Option<u32>,
    pub(crate) bg_color: Option<u32>,
}

/// Every visual field of a format. Two formats with equal keys share an xf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct XfKey {
    font: FontKey,
    border: BorderKey,
    fill: FillKey,
    font_scheme: String,
    theme: u8,
    hyperlink: bool,
    num_format: String,
    num_format_index: u8,
    locked: bool,
    hidden: bool,
    h_align: HorizontalAlignment,
    v_align: VerticalAlignment,
    text_wrap: bool,
    rotation: i16,
    indent: u8,
    shrink: bool,
    reading_order: u8,
    text_justlast: bool,
}

/// A cell format. Build it with the chained setters and register it with
/// `Workbook::add_format`, which hands back a `FormatId` for cell writes.
///
/// Setters that receive an out-of-range value leave the field unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    pub(crate) font_name: String,
    pub(crate) font_size: f64,
    pub(crate) font_color: Option<u32>,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) underline: Option<Underline>,
    pub(crate) font_strikeout: bool,
    pub(crate) font_outline: bool,
    pub(crate) font_shadow: bool,
    pub(crate) font_script: Option<Script>,
    pub(crate) font_family: u8,
    pub(crate) font_charset: u8,
    pub(crate) font_scheme: String,
    pub(crate) font_condense: bool,
    pub(crate) font_extend: bool,
    pub(crate) theme: u8,
    pub(crate) hyperlink: bool,

    pub(crate) num_format: String,
    pub(crate) num_format_index: u8,

    pub(crate) locked: bool,
    pub(crate) hidden: bool,

    pub(crate) h_align: HorizontalAlignment,
    pub(crate) v_align: VerticalAlignment,
    pub(crate) text_wrap: bool,
    pub(crate) rotation: i16,
    pub(crate) indent: u8,
    pub(crate) shrink: bool,
    pub(crate) reading_order: u8,
    pub(crate) text_justlast: bool,

    pub(crate) pattern: Pattern,
    pub(crate) bg_color: Option<u32>,
    pub(crate) fg_color: Option<u32>,

    pub(crate) bottom: BorderStyle,
    pub(crate) left: BorderStyle,
    pub(crate) right: BorderStyle,
    pub(crate) top: BorderStyle,
    pub(crate) diag_border: BorderStyle,
    pub(crate) diag_type: Option<DiagonalType>,
    pub(crate) bottom_color: Option<u32>,
    pub(crate) left_color: Option<u32>,
    pub(crate) right_color: Option<u32>,
    pub(crate) top_color: Option<u32>,
    pub(crate) diag_color: Option<u32>,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            font_name: String::new(),
            font_size: 11.0,
            font_color: None,
            bold: false,
            italic: false,
            underline: None,
            font_strikeout: false,
            font_outline: false,
            font_shadow: false,
            font_script: None,
            font_family: DEFAULT_FONT_FAMILY,
            font_charset: 0,
            font_scheme: String::new(),
            font_condense: false,
            font_extend: false,
            theme: 0,
            hyperlink: false,
            num_format: String::new(),
            num_format_index: 0,
            locked: true,
            hidden: false,
            h_align: HorizontalAlignment::None,
            v_align: VerticalAlignment::None,
            text_wrap: false,
            rotation: 0,
            indent: 0,
            shrink: false,
            reading_order: 0,
            text_justlast: false,
            pattern: Pattern::None,
            bg_color: None,
            fg_color: None,
            bottom: BorderStyle::None,
            left: BorderStyle::None,
            right: BorderStyle::None,
            top: BorderStyle::None,
            diag_border: BorderStyle::None,
            diag_type: None,
            bottom_color: None,
            left_color: None,
            right_color: None,
            top_color: None,
            diag_color: None,
        }
    }
}

impl Format {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_font_name(mut self, name: &str) -> Self {
        self.font_name = name.to_string();
        self
    }

    /// Sizes outside 1..=409 points are ignored.
    pub fn set_font_size(mut self, size: f64) -> Self {
        if (1.0..=409.0).contains(&size) {
            self.font_size = size;
        }
        self
    }

    pub fn set_font_color(mut self, color: u32) -> Self {
        self.font_color = Some(check_color(color));
        self
    }

    pub fn set_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn set_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn set_underline(mut self, style: Underline) -> Self {
        self.underline = Some(style);
        self
    }

    pub fn set_font_strikeout(mut self) -> Self {
        self.font_strikeout = true;
        self
    }

    pub fn set_font_script(mut self, script: Script) -> Self {
        self.font_script = Some(script);
        self
    }

    pub fn set_font_outline(mut self) -> Self {
        self.font_outline = true;
        self
    }

    pub fn set_font_shadow(mut self) -> Self {
        self.font_shadow = true;
        self
    }

    pub fn set_font_family(mut self, family: u8) -> Self {
        self.font_family = family;
        self
    }

    pub fn set_font_charset(mut self, charset: u8) -> Self {
        self.font_charset = charset;
        self
    }

    pub fn set_font_scheme(mut self, scheme: &str) -> Self {
        self.font_scheme = scheme.to_string();
        self
    }

    pub fn set_font_condense(mut self) -> Self {
        self.font_condense = true;
        self
    }

    pub fn set_font_extend(mut self) -> Self {
        self.font_extend = true;
        self
    }

    pub fn set_theme(mut self, theme: u8) -> Self {
        self.theme = theme;
        self
    }

    /// Marks the font as a hyperlink font, which drops the scheme element.
    pub fn set_hyperlink(mut self) -> Self {
        self.hyperlink = true;
        self
    }

    /// Custom number format such as `"0.000"` or `"d mmm yyyy"`.
    pub fn set_num_format(mut self, num_format: &str) -> Self {
        self.num_format = num_format.to_string();
        self
    }

    /// Excel built-in number format by index, e.g. 14 for `m/d/yy`.
    pub fn set_num_format_index(mut self, index: u8) -> Self {
        self.num_format_index = index;
        self
    }

    pub fn set_unlocked(mut self) -> Self {
        self.locked = false;
        self
    }

    pub fn set_hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn set_align(mut self, align: HorizontalAlignment) -> Self {
        self.h_align = align;
        self
    }

    pub fn set_valign(mut self, align: VerticalAlignment) -> Self {
        self.v_align = align;
        self
    }

    pub fn set_text_wrap(mut self) -> Self {
        self.text_wrap = true;
        self
    }

    /// Text angle in degrees: -90..=90, or 270 for stacked text.
    pub fn set_rotation(mut self, angle: i16) -> Self {
        match angle {
            270 => self.rotation = 255,
            -90..=-1 => self.rotation = 90 - angle,
            0..=90 => self.rotation = angle,
            _ => {
                log::warn!("Format::set_rotation(): angle {angle} outside range -90..=90");
                self.rotation = 0;
            }
        }
        self
    }

    pub fn set_indent(mut self, level: u8) -> Self {
        self.indent = level;
        self
    }

    pub fn set_shrink(mut self) -> Self {
        self.shrink = true;
        self
    }

    pub fn set_text_justlast(mut self) -> Self {
        self.text_justlast = true;
        self
    }

    /// 1 for context, 2 for left-to-right, 3 for right-to-left.
    pub fn set_reading_order(mut self, order: u8) -> Self {
        if order <= 2 {
            self.reading_order = order;
        }
        self
    }

    pub fn set_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn set_bg_color(mut self, color: u32) -> Self {
        self.bg_color = Some(check_color(color));
        self
    }

    pub fn set_fg_color(mut self, color: u32) -> Self {
        self.fg_color = Some(check_color(color));
        self
    }

    /// Same style on all four sides.
    pub fn set_border(mut self, style: BorderStyle) -> Self {
        self.bottom = style;
        self.top = style;
        self.left = style;
        self.right = style;
        self
    }

    pub fn set_border_color(mut self, color: u32) -> Self {
        let color = Some(check_color(color));
        self.bottom_color = color;
        self.top_color = color;
        self.left_color = color;
        self.right_color = color;
        self
    }

    pub fn set_bottom(mut self, style: BorderStyle) -> Self {
        self.bottom = style;
        self
    }

    pub fn set_bottom_color(mut self, color: u32) -> Self {
        self.bottom_color = Some(check_color(color));
        self
    }

    pub fn set_left(mut self, style: BorderStyle) -> Self {
        self.left = style;
        self
    }

    pub fn set_left_color(mut self, color: u32) -> Self {
        self.left_color = Some(check_color(color));
        self
    }

    pub fn set_right(mut self, style: BorderStyle) -> Self {
        self.right = style;
        self
    }

    pub fn set_right_color(mut self, color: u32) -> Self {
        self.right_color = Some(check_color(color));
        self
    }

    pub fn set_top(mut self, style: BorderStyle) -> Self {
        self.top = style;
        self
    }

    pub fn set_top_color(mut self, color: u32) -> Self {
        self.top_color = Some(check_color(color));
        self
    }

    pub fn set_diag_type(mut self, diag_type: DiagonalType) -> Self {
        self.diag_type = Some(diag_type);
        self
    }

    pub fn set_diag_color(mut self, color: u32) -> Self {
        self.diag_color = Some(check_color(color));
        self
    }

    pub fn set_diag_border(mut self, style: BorderStyle) -> Self {
        self.diag_border = style;
        self
    }

    pub(crate) fn font_key(&self) -> FontKey {
        FontKey {
            name: self.font_name.clone(),
            size_bits: self.font_size.to_bits(),
            bold: self.bold,
            italic: self.italic,
            color: self.font_color,
            underline: self.underline,
            strikeout: self.font_strikeout,
            outline: self.font_outline,
            shadow: self.font_shadow,
            script: self.font_script,
            family: self.font_family,
            charset: self.font_charset,
            condense: self.font_condense,
            extend: self.font_extend,
        }
    }

    pub(crate) fn border_key(&self) -> BorderKey {
        BorderKey {
            bottom: self.bottom,
            left: self.left,
            right: self.right,
            top: self.top,
            diag_border: self.diag_border,
            diag_type: self.diag_type,
            bottom_color: self.bottom_color,
            left_color: self.left_color,
            right_color: self.right_color,
            top_color: self.top_color,
            diag_color: self.diag_color,
        }
    }

    pub(crate) fn fill_key(&self) -> FillKey {
        FillKey {
            pattern: self.pattern,
            fg_color: self.fg_color,
            bg_color: self.bg_color,
        }
    }

    pub(crate) fn xf_key(&self) -> XfKey {
        XfKey {
            font: self.font_key(),
            border: self.border_key(),
            fill: self.fill_key(),
            font_scheme: self.font_scheme.clone(),
            theme: self.theme,
            hyperlink: self.hyperlink,
            num_format: self.num_format.clone(),
            num_format_index: self.num_format_index,
            locked: self.locked,
            hidden: self.hidden,
            h_align: self.h_align,
            v_align: self.v_align,
            text_wrap: self.text_wrap,
            rotation: self.rotation,
            indent: self.indent,
            shrink: self.shrink,
            reading_order: self.reading_order,
            text_justlast: self.text_justlast,
        }
    }

    /// Excel's solid fill swaps the meaning of the two colors, and a color
    /// without a pattern implies a solid fill. A lone fg color is never
    /// copied to bg.
    pub(crate) fn normalize_fill(&mut self) {
        if self.pattern == Pattern::Solid && self.bg_color.is_some() && self.fg_color.is_some() {
            std::mem::swap(&mut self.fg_color, &mut self.bg_color);
        }

        if self.pattern <= Pattern::Solid && self.bg_color.is_some() && self.fg_color.is_none() {
            self.fg_color = self.bg_color.take();
            self.pattern = Pattern::Solid;
        }

        if self.pattern <= Pattern::Solid && self.bg_color.is_none() && self.fg_color.is_some() {
            self.pattern = Pattern::Solid;
        }
    }

    pub(crate) fn has_alignment(&self) -> bool {
        self.h_align != HorizontalAlignment::None
            || !matches!(self.v_align, VerticalAlignment::None | VerticalAlignment::Bottom)
            || self.indent != 0
            || self.rotation != 0
            || self.text_wrap
            || self.shrink
            || self.reading_order != 0
    }

    pub(crate) fn apply_alignment(&self) -> bool {
        self.h_align != HorizontalAlignment::None
            || self.v_align != VerticalAlignment::None
            || self.indent != 0
            || self.rotation != 0
            || self.text_wrap
            || self.shrink
            || self.reading_order != 0
    }

    pub(crate) fn has_protection(&self) -> bool {
        !self.locked || self.hidden
    }
}

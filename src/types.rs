use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::chart::Chart;
use crate::image::ImageType;
use crate::styles::FormatId;

pub const DEFAULT_COL_WIDTH: f64 = 8.43;
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Stored payload of one cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    Number(f64),
    /// Index into the workbook shared string table.
    String(u32),
    /// Constant-memory mode only: the text goes straight into the sheet.
    InlineString(String),
    Formula { formula: String, result: f64 },
    ArrayFormula { formula: String, range: String, result: f64 },
    Blank,
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cell {
    pub value: CellValue,
    pub format: Option<FormatId>,
}

impl Cell {
    pub fn new(value: CellValue, format: Option<FormatId>) -> Self {
        Self { value, format }
    }
}

/// Row metadata plus the cells of that row in column order.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub height: f64,
    pub format: Option<FormatId>,
    pub hidden: bool,
    pub level: u8,
    pub collapsed: bool,
    pub row_changed: bool,
    pub data_changed: bool,
    pub height_changed: bool,
    pub cells: BTreeMap<u16, Cell>,
}

impl Default for Row {
    fn default() -> Self {
        Self {
            height: DEFAULT_ROW_HEIGHT,
            format: None,
            hidden: false,
            level: 0,
            collapsed: false,
            row_changed: false,
            data_changed: false,
            height_changed: false,
            cells: BTreeMap::new(),
        }
    }
}

impl Row {
    /// Back to a pristine row, used after a constant-memory flush.
    pub fn reset(&mut self) {
        *self = Row::default();
    }
}

/// Optional row and column settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowColOptions {
    pub hidden: bool,
    pub level: u8,
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColOptions {
    pub first_col: u16,
    pub last_col: u16,
    pub width: f64,
    pub format: Option<FormatId>,
    pub hidden: bool,
    pub level: u8,
    pub collapsed: bool,
}

/// Placement tweaks for inserted images and charts. A scale of `0.0` is
/// treated as `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageOptions {
    pub x_offset: i32,
    pub y_offset: i32,
    pub x_scale: f64,
    pub y_scale: f64,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { x_offset: 0, y_offset: 0, x_scale: 1.0, y_scale: 1.0 }
    }
}

impl ImageOptions {
    pub(crate) fn normalized(mut self) -> Self {
        if self.x_scale == 0.0 {
            self.x_scale = 1.0;
        }
        if self.y_scale == 0.0 {
            self.y_scale = 1.0;
        }
        self
    }
}

/// An image waiting for `prepare_drawings`. The file itself is only read
/// again when the package is written.
#[derive(Debug, Clone)]
pub(crate) struct ImageObject {
    pub row: u32,
    pub col: u16,
    pub path: PathBuf,
    pub short_name: String,
    pub options: ImageOptions,
    pub image_type: ImageType,
    pub width: f64,
    pub height: f64,
    pub x_dpi: f64,
    pub y_dpi: f64,
}

#[derive(Debug)]
pub(crate) struct ChartObject {
    pub row: u32,
    pub col: u16,
    pub options: ImageOptions,
    pub chart: Chart,
}

/// Object geometry in pixels, before conversion to EMUs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectPosition {
    pub row: u32,
    pub col: u16,
    pub x_offset: f64,
    pub y_offset: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeaderFooterOptions {
    pub margin: f64,
}

/// Things a user may still do on a protected sheet. Every flag defaults to
/// off, which mirrors Excel's own protection dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtectionOptions {
    pub no_select_locked_cells: bool,
    pub no_select_unlocked_cells: bool,
    pub format_cells: bool,
    pub format_columns: bool,
    pub format_rows: bool,
    pub insert_columns: bool,
    pub insert_rows: bool,
    pub insert_hyperlinks: bool,
    pub delete_columns: bool,
    pub delete_rows: bool,
    pub sort: bool,
    pub autofilter: bool,
    pub pivot_tables: bool,
    pub scenarios: bool,
    pub objects: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Protection {
    pub is_configured: bool,
    pub no_sheet: bool,
    pub content: bool,
    pub hash: String,
    pub options: ProtectionOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaneType {
    Freeze,
    Split,
    FreezeSplit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Panes {
    pub pane_type: PaneType,
    pub first_row: u32,
    pub first_col: u16,
    pub top_row: u32,
    pub left_col: u16,
    pub x_split: f64,
    pub y_split: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Selection {
    pub pane: String,
    pub active_cell: String,
    pub sqref: String,
}

/// Screen and print gridline visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gridlines {
    HideAll,
    ShowScreen,
    ShowPrint,
    ShowAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HyperlinkType {
    Url,
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hyperlink {
    pub link_type: HyperlinkType,
    /// Relationship target for external links, the in-document location
    /// for internal ones.
    pub target: String,
    /// Fragment after `#` on external links, display text on internal ones.
    pub location: Option<String>,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    /// Build a range, swapping reversed corners.
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_range_swaps_corners() {
        let range = CellRange::new(5, 3, 1, 0);
        assert_eq!(
            range,
            CellRange { first_row: 1, first_col: 0, last_row: 5, last_col: 3 }
        );
        assert!(!range.is_single_cell());
        assert!(CellRange::new(2, 2, 2, 2).is_single_cell());
    }

    #[test]
    fn test_image_options_zero_scale() {
        let options = ImageOptions { x_scale: 0.0, y_scale: 2.0, ..Default::default() };
        let options = options.normalized();
        assert_eq!((options.x_scale, options.y_scale), (1.0, 2.0));
    }

    #[test]
    fn test_row_reset() {
        let mut row = Row { height: 30.0, hidden: true, data_changed: true, ..Default::default() };
        row.cells.insert(1, Cell::new(CellValue::Number(1.0), None));
        row.reset();
        assert_eq!(row.height, DEFAULT_ROW_HEIGHT);
        assert!(!row.hidden && !row.data_changed);
        assert!(row.cells.is_empty());
    }
}

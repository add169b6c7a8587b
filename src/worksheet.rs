use std::cell::{Cell as TabCell, RefCell};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::warn;

use crate::chart::{Chart, DataPoint};
use crate::drawing::{AnchorEditAs, AnchorType, Drawing, DrawingCoords, DrawingObject};
use crate::error::{Result, XlsxError};
use crate::image::image_properties;
use crate::relationships::Relationships;
use crate::shared_strings::{needs_space_preserve, SharedStringTable};
use crate::styles::{FormatId, StyleRegistry};
use crate::types::{
    Cell, CellRange, CellValue, ChartObject, ColOptions, Gridlines, HeaderFooterOptions,
    Hyperlink, HyperlinkType, ImageObject, ImageOptions, ObjectPosition, PaneType, Panes,
    Protection, ProtectionOptions, Row, RowColOptions, Selection, DEFAULT_COL_WIDTH,
    DEFAULT_ROW_HEIGHT,
};
use crate::utility::{
    datetime_to_excel_date, rowcol_to_cell, rowcol_to_range, strip_formula, utf8_strlen,
    write_cell_ref, DateTime, COL_MAX, ROW_MAX,
};
use crate::validation::{write_data_validations, DataValidation, StoredValidation};
use crate::xml::{
    escape_attr_into, escape_control_characters, escape_data_into, write_f64, Attr, XmlWriter,
};

const SCHEMA_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const SCHEMA_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const MAX_STRING_LENGTH: usize = 32_767;
const MAX_URL_LENGTH: usize = 255;
const MAX_NUMBER_URLS: u32 = 65_530;
const MAX_HEADER_FOOTER_LENGTH: usize = 255;
const MAX_PAGE_BREAKS: usize = 1023;

const EMU_PER_PIXEL: f64 = 9525.0;
const DEFAULT_DPI: f64 = 96.0;
const DEFAULT_CHART_WIDTH: f64 = 480.0;
const DEFAULT_CHART_HEIGHT: f64 = 288.0;
const MAX_DIGIT_WIDTH: f64 = 7.0;
const CELL_PADDING: f64 = 5.0;

/// Active and first visible tab, shared by every sheet of a workbook so that
/// `activate` and `hide` on one sheet can adjust the others.
#[derive(Debug, Default)]
pub(crate) struct SheetTabs {
    pub active: TabCell<u16>,
    pub first: TabCell<u16>,
}

/// Everything a worksheet borrows from its workbook.
pub(crate) struct WorksheetInit {
    pub name: String,
    pub index: u16,
    pub optimize: bool,
    pub tmpdir: Option<PathBuf>,
    pub date_1904: bool,
    pub sst: Rc<RefCell<SharedStringTable>>,
    pub styles: Rc<RefCell<StyleRegistry>>,
    pub default_url_format: FormatId,
    pub tabs: Rc<SheetTabs>,
}

/// One worksheet: cell table, sheet-level settings, embedded objects.
///
/// In constant-memory mode only the current row is held; moving to a later
/// row serializes the previous one to a temp file and writing above the
/// current row is refused.
pub struct Worksheet {
    name: String,
    index: u16,
    optimize: bool,
    date_1904: bool,
    sst: Rc<RefCell<SharedStringTable>>,
    styles: Rc<RefCell<StyleRegistry>>,
    default_url_format: FormatId,
    tabs: Rc<SheetTabs>,

    table: BTreeMap<u32, Row>,
    hyperlinks: BTreeMap<(u32, u16), Hyperlink>,
    hlink_count: u32,

    optimize_row: Row,
    optimize_row_num: u32,
    optimize_tmpfile: Option<BufWriter<File>>,

    dim_rowmin: u32,
    dim_rowmax: u32,
    dim_colmin: u16,
    dim_colmax: u16,

    merged_ranges: Vec<CellRange>,
    col_options: BTreeMap<u16, ColOptions>,
    col_size_changed: bool,
    row_size_changed: bool,

    pub(crate) images: Vec<ImageObject>,
    pub(crate) charts: Vec<ChartObject>,
    drawing: Option<Drawing>,
    drawing_link: Option<String>,
    drawing_rels: Relationships,

    panes: Option<Panes>,
    selections: Vec<Selection>,
    pub(crate) autofilter: Option<CellRange>,
    validations: Vec<StoredValidation>,

    selected: bool,
    hidden: bool,

    landscape: bool,
    paper_size: u8,
    print_scale: u16,
    fit_page: bool,
    fit_width: u16,
    fit_height: u16,
    print_across: bool,
    page_start: u16,
    page_setup_changed: bool,
    page_view: bool,

    margin_left: f64,
    margin_right: f64,
    margin_top: f64,
    margin_bottom: f64,
    margin_header: f64,
    margin_footer: f64,
    header: String,
    footer: String,
    header_footer_changed: bool,

    print_options_changed: bool,
    print_headers: bool,
    print_gridlines: bool,
    screen_gridlines: bool,
    center_horizontally: bool,
    center_vertically: bool,

    pub(crate) repeat_rows: Option<(u32, u32)>,
    pub(crate) repeat_cols: Option<(u16, u16)>,
    pub(crate) print_area: Option<CellRange>,
    hbreaks: Vec<u32>,
    vbreaks: Vec<u16>,

    zoom: u16,
    zoom_scale_normal: bool,
    show_zeros: bool,
    right_to_left: bool,
    tab_color: Option<u32>,
    protection: Protection,

    outline_on: bool,
    outline_style: bool,
    outline_below: bool,
    outline_right: bool,
    outline_changed: bool,
    outline_row_level: u8,
    outline_col_level: u8,

    default_row_height: f64,
    default_row_pixels: u32,
    default_col_pixels: u32,
    default_row_zeroed: bool,
    default_row_set: bool,
}

impl std::fmt::Debug for Worksheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worksheet")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("optimize", &self.optimize)
            .field("rows", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl Worksheet {
    pub(crate) fn new(init: WorksheetInit) -> Result<Self> {
        let optimize_tmpfile = if init.optimize {
            let file = match &init.tmpdir {
                Some(dir) => tempfile::tempfile_in(dir),
                None => tempfile::tempfile(),
            }
            .map_err(|e| {
                warn!("worksheet '{}': error creating row tmpfile: {}", init.name, e);
                XlsxError::CreatingTmpfile(e)
            })?;
            Some(BufWriter::new(file))
        } else {
            None
        };

        Ok(Self {
            name: init.name,
            index: init.index,
            optimize: init.optimize,
            date_1904: init.date_1904,
            sst: init.sst,
            styles: init.styles,
            default_url_format: init.default_url_format,
            tabs: init.tabs,

            table: BTreeMap::new(),
            hyperlinks: BTreeMap::new(),
            hlink_count: 0,

            optimize_row: Row::default(),
            optimize_row_num: 0,
            optimize_tmpfile,

            dim_rowmin: ROW_MAX,
            dim_rowmax: 0,
            dim_colmin: COL_MAX,
            dim_colmax: 0,

            merged_ranges: Vec::new(),
            col_options: BTreeMap::new(),
            col_size_changed: false,
            row_size_changed: false,

            images: Vec::new(),
            charts: Vec::new(),
            drawing: None,
            drawing_link: None,
            drawing_rels: Relationships::new(),

            panes: None,
            selections: Vec::new(),
            autofilter: None,
            validations: Vec::new(),

            selected: false,
            hidden: false,

            landscape: false,
            paper_size: 0,
            print_scale: 100,
            fit_page: false,
            fit_width: 0,
            fit_height: 0,
            print_across: false,
            page_start: 0,
            page_setup_changed: false,
            page_view: false,

            margin_left: 0.7,
            margin_right: 0.7,
            margin_top: 0.75,
            margin_bottom: 0.75,
            margin_header: 0.3,
            margin_footer: 0.3,
            header: String::new(),
            footer: String::new(),
            header_footer_changed: false,

            print_options_changed: false,
            print_headers: false,
            print_gridlines: false,
            screen_gridlines: true,
            center_horizontally: false,
            center_vertically: false,

            repeat_rows: None,
            repeat_cols: None,
            print_area: None,
            hbreaks: Vec::new(),
            vbreaks: Vec::new(),

            zoom: 100,
            zoom_scale_normal: true,
            show_zeros: true,
            right_to_left: false,
            tab_color: None,
            protection: Protection::default(),

            outline_on: true,
            outline_style: true,
            outline_below: true,
            outline_right: false,
            outline_changed: false,
            outline_row_level: 0,
            outline_col_level: 0,

            default_row_height: DEFAULT_ROW_HEIGHT,
            default_row_pixels: 20,
            default_col_pixels: 64,
            default_row_zeroed: false,
            default_row_set: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn is_constant_memory(&self) -> bool {
        self.optimize
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Used range as `(first_row, first_col, last_row, last_col)`, or `None`
    /// for a sheet nothing has been written to.
    pub fn dimensions(&self) -> Option<(u32, u16, u32, u16)> {
        if self.dim_rowmin == ROW_MAX && self.dim_colmin == COL_MAX {
            return None;
        }
        let first_row = if self.dim_rowmin == ROW_MAX { 0 } else { self.dim_rowmin };
        let first_col = if self.dim_colmin == COL_MAX { 0 } else { self.dim_colmin };
        Some((first_row, first_col, self.dim_rowmax, self.dim_colmax))
    }

    // ------------------------------------------------------------------
    // Cell storage
    // ------------------------------------------------------------------

    /// Bounds and constant-memory ordering check with no side effects.
    fn check_cell(&self, row: u32, col: u16) -> Result<()> {
        if row >= ROW_MAX || col >= COL_MAX {
            return Err(XlsxError::WorksheetIndexOutOfRange);
        }
        if self.optimize && row < self.optimize_row_num {
            return Err(XlsxError::WorksheetIndexOutOfRange);
        }
        Ok(())
    }

    /// Validate a cell position and grow the recorded dimension. Either axis
    /// can be left out of the dimension, which also skips the row-order check
    /// of constant-memory mode.
    fn check_dimensions(
        &mut self,
        row: u32,
        col: u16,
        ignore_row: bool,
        ignore_col: bool,
    ) -> Result<()> {
        if row >= ROW_MAX || col >= COL_MAX {
            return Err(XlsxError::WorksheetIndexOutOfRange);
        }

        if self.optimize && !ignore_row && !ignore_col && row < self.optimize_row_num {
            return Err(XlsxError::WorksheetIndexOutOfRange);
        }

        if !ignore_row {
            self.dim_rowmin = self.dim_rowmin.min(row);
            self.dim_rowmax = self.dim_rowmax.max(row);
        }
        if !ignore_col {
            self.dim_colmin = self.dim_colmin.min(col);
            self.dim_colmax = self.dim_colmax.max(col);
        }
        Ok(())
    }

    fn row_mut(&mut self, row_num: u32) -> Result<&mut Row> {
        if !self.optimize {
            let height = self.default_row_height;
            return Ok(self
                .table
                .entry(row_num)
                .or_insert_with(|| Row { height, ..Row::default() }));
        }

        if row_num < self.optimize_row_num {
            return Err(XlsxError::WorksheetIndexOutOfRange);
        }
        if row_num > self.optimize_row_num {
            self.write_single_row()?;
            self.optimize_row_num = row_num;
        }
        Ok(&mut self.optimize_row)
    }

    fn insert_cell(&mut self, row_num: u32, col: u16, cell: Cell) -> Result<()> {
        let row = self.row_mut(row_num)?;
        row.cells.insert(col, cell);
        row.data_changed = true;
        Ok(())
    }

    /// Serialize the current constant-memory row to the temp file and start
    /// a fresh one.
    fn write_single_row(&mut self) -> Result<()> {
        if !self.optimize_row.row_changed && !self.optimize_row.data_changed {
            return Ok(());
        }

        let styles = Rc::clone(&self.styles);
        let mut styles = styles.borrow_mut();
        let mut writer = XmlWriter::with_capacity(128 + self.optimize_row.cells.len() * 32);
        self.write_row(&mut writer, &mut styles, self.optimize_row_num, &self.optimize_row, None);

        if let Some(tmpfile) = self.optimize_tmpfile.as_mut() {
            tmpfile.write_all(writer.as_bytes())?;
        }

        self.optimize_row.reset();
        self.optimize_row.height = self.default_row_height;
        Ok(())
    }

    /// NaN and infinities have no representation in a `<v>` element.
    pub fn write_number(
        &mut self,
        row: u32,
        col: u16,
        number: f64,
        format: Option<FormatId>,
    ) -> Result<()> {
        check_finite(number, "write_number")?;
        self.check_dimensions(row, col, false, false)?;
        self.insert_cell(row, col, Cell::new(CellValue::Number(number), format))
    }

    /// Store a string. Empty strings become a formatted blank, or nothing at
    /// all without a format.
    pub fn write_string(
        &mut self,
        row: u32,
        col: u16,
        string: &str,
        format: Option<FormatId>,
    ) -> Result<()> {
        if string.is_empty() {
            return self.write_blank(row, col, format);
        }

        if utf8_strlen(string) > MAX_STRING_LENGTH {
            warn!("write_string(): string exceeds Excel's limit of 32,767 characters");
            return Err(XlsxError::MaxStringLengthExceeded);
        }

        self.check_dimensions(row, col, false, false)?;

        let value = if self.optimize {
            CellValue::InlineString(escape_control_characters(string).into_owned())
        } else {
            CellValue::String(self.sst.borrow_mut().get_or_insert(string))
        };
        self.insert_cell(row, col, Cell::new(value, format))
    }

    pub fn write_formula(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        format: Option<FormatId>,
    ) -> Result<()> {
        self.write_formula_num(row, col, formula, format, 0.0)
    }

    /// Formula with a cached result for readers that don't recalculate.
    pub fn write_formula_num(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        format: Option<FormatId>,
        result: f64,
    ) -> Result<()> {
        if formula.is_empty() {
            return Err(XlsxError::NullParameterIgnored);
        }
        check_finite(result, "write_formula_num")?;
        self.check_dimensions(row, col, false, false)?;

        let value = CellValue::Formula { formula: strip_formula(formula).to_string(), result };
        self.insert_cell(row, col, Cell::new(value, format))
    }

    pub fn write_array_formula(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        formula: &str,
        format: Option<FormatId>,
    ) -> Result<()> {
        self.write_array_formula_num(first_row, first_col, last_row, last_col, formula, format, 0.0)
    }

    /// Array formula over a range. The formula lives in the top-left cell;
    /// the rest of the range is filled with zeros carrying the format.
    #[allow(clippy::too_many_arguments)]
    pub fn write_array_formula_num(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        formula: &str,
        format: Option<FormatId>,
        result: f64,
    ) -> Result<()> {
        if formula.is_empty() {
            return Err(XlsxError::NullParameterIgnored);
        }
        check_finite(result, "write_array_formula_num")?;

        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.check_cell(range.first_row, range.first_col)?;
        self.check_dimensions(range.last_row, range.last_col, false, false)?;
        self.check_dimensions(range.first_row, range.first_col, false, false)?;

        let reference = if range.is_single_cell() {
            rowcol_to_cell(range.first_row, range.last_col)
        } else {
            rowcol_to_range(range.first_row, range.first_col, range.last_row, range.last_col)
        };

        let formula = formula
            .strip_prefix("{=")
            .or_else(|| formula.strip_prefix('{'))
            .unwrap_or(formula);
        let formula = formula.strip_suffix('}').unwrap_or(formula);
        let formula = strip_formula(formula).to_string();

        let value = CellValue::ArrayFormula { formula, range: reference, result };
        self.insert_cell(range.first_row, range.first_col, Cell::new(value, format))?;

        if !self.optimize {
            for row in range.first_row..=range.last_row {
                for col in range.first_col..=range.last_col {
                    if row == range.first_row && col == range.first_col {
                        continue;
                    }
                    self.write_number(row, col, 0.0, format)?;
                }
            }
        }
        Ok(())
    }

    /// A blank cell only carries a format; without one nothing is stored.
    pub fn write_blank(&mut self, row: u32, col: u16, format: Option<FormatId>) -> Result<()> {
        let Some(format) = format else {
            return Ok(());
        };
        self.check_dimensions(row, col, false, false)?;
        self.insert_cell(row, col, Cell::new(CellValue::Blank, Some(format)))
    }

    pub fn write_boolean(
        &mut self,
        row: u32,
        col: u16,
        value: bool,
        format: Option<FormatId>,
    ) -> Result<()> {
        self.check_dimensions(row, col, false, false)?;
        self.insert_cell(row, col, Cell::new(CellValue::Boolean(value), format))
    }

    /// Date/time as a serial number in the workbook's epoch. Needs a number
    /// format to display as a date.
    pub fn write_datetime(
        &mut self,
        row: u32,
        col: u16,
        datetime: &DateTime,
        format: Option<FormatId>,
    ) -> Result<()> {
        let number = datetime_to_excel_date(datetime, self.date_1904);
        self.write_number(row, col, number, format)
    }

    pub fn write_url(
        &mut self,
        row: u32,
        col: u16,
        url: &str,
        format: Option<FormatId>,
    ) -> Result<()> {
        self.write_url_opt(row, col, url, format, None, None)
    }

    /// Hyperlink with optional display text and tooltip. `internal:Sheet2!A1`
    /// links inside the workbook, `external:c:\file.xlsx#Sheet1!A1` to a
    /// local file, anything else is treated as a URL.
    pub fn write_url_opt(
        &mut self,
        row: u32,
        col: u16,
        url: &str,
        format: Option<FormatId>,
        string: Option<&str>,
        tooltip: Option<&str>,
    ) -> Result<()> {
        if url.is_empty() {
            return Err(XlsxError::NullParameterIgnored);
        }

        if self.hlink_count > MAX_NUMBER_URLS {
            warn!("write_url(): maximum number of worksheet URLs (65530) exceeded");
            return Err(XlsxError::WorksheetMaxNumberUrlsExceeded);
        }

        self.check_cell(row, col)?;

        let (link_type, rest) = if let Some(rest) = url.strip_prefix("internal:") {
            (HyperlinkType::Internal, rest)
        } else if let Some(rest) = url.strip_prefix("external:") {
            (HyperlinkType::External, rest)
        } else {
            (HyperlinkType::Url, url)
        };

        let mut display = match string {
            Some(s) if !s.is_empty() => s.to_string(),
            _ if link_type == HyperlinkType::Url => {
                url.strip_prefix("mailto:").unwrap_or(url).to_string()
            }
            _ => rest.to_string(),
        };

        let mut target = rest.to_string();
        let mut location = None;

        match link_type {
            HyperlinkType::Url => target = escape_url(&target),
            HyperlinkType::Internal => location = Some(display.clone()),
            HyperlinkType::External => {
                target = target.replace('/', "\\");
                display = display.replace('/', "\\");

                if let Some((path, anchor)) = target.split_once('#') {
                    location = Some(anchor.to_string());
                    target = path.to_string();
                }

                if target.contains(':') || target.contains("\\\\") {
                    target = format!("file:///{}", target);
                } else if let Some(relative) = target.strip_prefix(".\\") {
                    target = relative.to_string();
                }
            }
        }

        let location_too_long = link_type == HyperlinkType::External
            && location.as_deref().is_some_and(|l| utf8_strlen(l) > MAX_URL_LENGTH);
        if utf8_strlen(&target) > MAX_URL_LENGTH || location_too_long {
            warn!("write_url(): URL exceeds Excel's limit of 255 characters: {}", url);
            return Err(XlsxError::String255LengthExceeded);
        }

        let format = format.or(Some(self.default_url_format));
        self.write_string(row, col, &display, format)?;

        self.hyperlinks.insert(
            (row, col),
            Hyperlink {
                link_type,
                target,
                location,
                tooltip: tooltip.filter(|t| !t.is_empty()).map(str::to_string),
            },
        );
        self.hlink_count += 1;
        Ok(())
    }

    /// Value the chart cache sees for one cell.
    pub(crate) fn chart_data_point(&self, row: u32, col: u16) -> DataPoint {
        let Some(cell) = self.table.get(&row).and_then(|r| r.cells.get(&col)) else {
            return DataPoint::NoData;
        };
        match &cell.value {
            CellValue::Number(number) => DataPoint::Number(*number),
            CellValue::String(id) => match self.sst.borrow().get(*id) {
                Some(s) => DataPoint::String(s.to_string()),
                None => DataPoint::NoData,
            },
            _ => DataPoint::Number(0.0),
        }
    }

    // ------------------------------------------------------------------
    // Rows, columns, ranges
    // ------------------------------------------------------------------

    pub fn set_row(&mut self, row: u32, height: f64, format: Option<FormatId>) -> Result<()> {
        self.set_row_opt(row, height, format, &RowColOptions::default())
    }

    /// Row height in points plus format and outline options. A height of 0
    /// hides the row.
    pub fn set_row_opt(
        &mut self,
        row: u32,
        height: f64,
        format: Option<FormatId>,
        options: &RowColOptions,
    ) -> Result<()> {
        let min_col = if self.dim_colmin == COL_MAX { 0 } else { self.dim_colmin };
        self.check_dimensions(row, min_col, false, false)?;

        let (height, hidden) = if height == 0.0 {
            (self.default_row_height, true)
        } else {
            (height, options.hidden)
        };
        let level = options.level.min(7);
        self.outline_row_level = self.outline_row_level.max(level);

        let default_row_height = self.default_row_height;
        let row = self.row_mut(row)?;
        row.height = height;
        row.format = format;
        row.hidden = hidden;
        row.level = level;
        row.collapsed = options.collapsed;
        row.row_changed = true;
        if height != default_row_height {
            row.height_changed = true;
        }

        if height != default_row_height || hidden {
            self.row_size_changed = true;
        }
        Ok(())
    }

    pub fn set_column(
        &mut self,
        first_col: u16,
        last_col: u16,
        width: f64,
        format: Option<FormatId>,
    ) -> Result<()> {
        self.set_column_opt(first_col, last_col, width, format, &RowColOptions::default())
    }

    /// Width in character units plus format and outline options for a span
    /// of columns.
    pub fn set_column_opt(
        &mut self,
        first_col: u16,
        last_col: u16,
        width: f64,
        format: Option<FormatId>,
        options: &RowColOptions,
    ) -> Result<()> {
        let (first_col, last_col) = if first_col > last_col {
            (last_col, first_col)
        } else {
            (first_col, last_col)
        };

        // Width-only changes don't count towards the used range.
        let ignore_col = !(format.is_some() || (width != DEFAULT_COL_WIDTH && options.hidden));
        self.check_dimensions(0, last_col, true, ignore_col)?;
        self.check_dimensions(0, first_col, true, ignore_col)?;

        let level = options.level.min(7);
        self.outline_col_level = self.outline_col_level.max(level);

        self.col_options.insert(
            first_col,
            ColOptions {
                first_col,
                last_col,
                width,
                format,
                hidden: options.hidden,
                level,
                collapsed: options.collapsed,
            },
        );
        self.col_size_changed = true;
        Ok(())
    }

    /// Options of the column span covering `col`.
    fn col_option(&self, col: u16) -> Option<&ColOptions> {
        self.col_options
            .range(..=col)
            .rev()
            .map(|(_, options)| options)
            .find(|options| options.last_col >= col)
    }

    /// Merge a range, writing `string` in the top-left cell and formatted
    /// blanks elsewhere. Overlaps with other merges are not checked.
    pub fn merge_range(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        string: &str,
        format: Option<FormatId>,
    ) -> Result<()> {
        if first_row == last_row && first_col == last_col {
            warn!("merge_range(): can't merge a single cell");
            return Err(XlsxError::ParameterValidation);
        }
        if utf8_strlen(string) > MAX_STRING_LENGTH {
            return Err(XlsxError::MaxStringLengthExceeded);
        }

        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.check_cell(range.first_row, range.first_col)?;
        self.check_dimensions(range.last_row, range.last_col, false, false)?;

        self.merged_ranges.push(range);

        self.write_string(range.first_row, range.first_col, string, format)?;
        for row in range.first_row..=range.last_row {
            for col in range.first_col..=range.last_col {
                if row == range.first_row && col == range.first_col {
                    continue;
                }
                self.write_blank(row, col, format)?;
            }
        }
        Ok(())
    }

    pub fn autofilter(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<()> {
        if first_row == last_row && first_col == last_col {
            warn!("autofilter(): filter range must span more than one cell");
            return Err(XlsxError::ParameterValidation);
        }
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.check_dimensions(range.last_row, range.last_col, true, true)?;
        self.autofilter = Some(range);
        Ok(())
    }

    pub fn data_validation_cell(
        &mut self,
        row: u32,
        col: u16,
        validation: &DataValidation,
    ) -> Result<()> {
        self.data_validation_range(row, col, row, col, validation)
    }

    pub fn data_validation_range(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        validation: &DataValidation,
    ) -> Result<()> {
        if !validation.check()? {
            return Ok(());
        }

        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.check_dimensions(range.last_row, range.last_col, true, true)?;

        let sqref = if range.is_single_cell() {
            rowcol_to_cell(range.first_row, range.last_col)
        } else {
            rowcol_to_range(range.first_row, range.first_col, range.last_row, range.last_col)
        };
        self.validations.push(validation.to_stored(sqref));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Images and charts
    // ------------------------------------------------------------------

    pub fn insert_image(&mut self, row: u32, col: u16, path: impl AsRef<Path>) -> Result<()> {
        self.insert_image_opt(row, col, path, &ImageOptions::default())
    }

    /// Anchor a PNG, JPEG or BMP file at a cell. The file is read now for its
    /// size and again when the package is written.
    pub fn insert_image_opt(
        &mut self,
        row: u32,
        col: u16,
        path: impl AsRef<Path>,
        options: &ImageOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        self.check_dimensions(row, col, true, true)?;

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "insert_image(): file doesn't exist or can't be opened: {}: {}",
                    path.display(),
                    e
                );
                return Err(XlsxError::ParameterValidation);
            }
        };

        let display_name = path.to_string_lossy();
        let short_name = display_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();
        let info = image_properties(&data, &short_name)?;

        self.images.push(ImageObject {
            row,
            col,
            path: path.to_path_buf(),
            short_name,
            options: options.normalized(),
            image_type: info.image_type,
            width: info.width as f64,
            height: info.height as f64,
            x_dpi: info.x_dpi,
            y_dpi: info.y_dpi,
        });
        Ok(())
    }

    pub fn insert_chart(&mut self, row: u32, col: u16, chart: Chart) -> Result<()> {
        self.insert_chart_opt(row, col, chart, &ImageOptions::default())
    }

    /// Anchor a chart at a cell. The worksheet takes ownership, so a chart
    /// can only ever be placed once.
    pub fn insert_chart_opt(
        &mut self,
        row: u32,
        col: u16,
        chart: Chart,
        options: &ImageOptions,
    ) -> Result<()> {
        self.check_dimensions(row, col, true, true)?;
        chart.validate()?;
        self.charts.push(ChartObject { row, col, options: options.normalized(), chart });
        Ok(())
    }

    pub(crate) fn drawing(&self) -> Option<&Drawing> {
        self.drawing.as_ref()
    }

    pub(crate) fn drawing_rels(&self) -> &Relationships {
        &self.drawing_rels
    }

    fn ensure_drawing(&mut self, drawing_id: u32) -> &mut Drawing {
        if self.drawing_link.is_none() {
            self.drawing_link = Some(format!("../drawings/drawing{}.xml", drawing_id));
        }
        self.drawing.get_or_insert_with(Drawing::new)
    }

    /// Place image `image_index` of this sheet in the drawing as
    /// `xl/media/image{image_ref_id}`.
    pub(crate) fn prepare_image(&mut self, image_index: usize, image_ref_id: u32, drawing_id: u32) {
        let Some(image) = self.images.get(image_index) else {
            return;
        };

        let position = ObjectPosition {
            row: image.row,
            col: image.col,
            x_offset: image.options.x_offset as f64,
            y_offset: image.options.y_offset as f64,
            width: image.width * image.options.x_scale * DEFAULT_DPI / image.x_dpi,
            height: image.height * image.options.y_scale * DEFAULT_DPI / image.y_dpi,
        };
        let target = format!("../media/image{}.{}", image_ref_id, image.image_type.extension());

        let mut object = self.position_object_emus(&position, AnchorType::Image);
        object.description = image.short_name.clone();

        self.ensure_drawing(drawing_id).add_object(object);
        self.drawing_rels.add_document_relationship("/image", &target);
    }

    /// Place chart `chart_index` of this sheet in the drawing as
    /// `xl/charts/chart{chart_ref_id}.xml`.
    pub(crate) fn prepare_chart(&mut self, chart_index: usize, chart_ref_id: u32, drawing_id: u32) {
        let Some(chart) = self.charts.get(chart_index) else {
            return;
        };

        let position = ObjectPosition {
            row: chart.row,
            col: chart.col,
            x_offset: chart.options.x_offset as f64,
            y_offset: chart.options.y_offset as f64,
            width: DEFAULT_CHART_WIDTH * chart.options.x_scale,
            height: DEFAULT_CHART_HEIGHT * chart.options.y_scale,
        };

        let object = self.position_object_emus(&position, AnchorType::Chart);
        self.ensure_drawing(drawing_id).add_object(object);
        self.drawing_rels
            .add_document_relationship("/chart", &format!("../charts/chart{}.xml", chart_ref_id));
    }

    fn size_col(&self, col: u16) -> f64 {
        match self.col_option(col) {
            Some(options) if options.hidden => 0.0,
            Some(options) => col_width_to_pixels(options.width) as f64,
            None => self.default_col_pixels as f64,
        }
    }

    fn size_row(&self, row: u32) -> f64 {
        match self.table.get(&row) {
            Some(r) if r.hidden => 0.0,
            Some(r) => (4.0 / 3.0 * r.height) as u32 as f64,
            None => (4.0 / 3.0 * self.default_row_height) as u32 as f64,
        }
    }

    /// Convert a pixel position relative to a cell into a two-cell anchor.
    /// Negative offsets walk back over preceding cells; offsets larger than
    /// the cell walk forward.
    fn position_object_pixels(&self, position: &ObjectPosition) -> (DrawingCoords, DrawingCoords, f64, f64) {
        let mut col_start = position.col;
        let mut row_start = position.row;
        let mut x1 = position.x_offset;
        let mut y1 = position.y_offset;
        let mut width = position.width;
        let mut height = position.height;

        while x1 < 0.0 && col_start > 0 {
            x1 += self.size_col(col_start - 1);
            col_start -= 1;
        }
        while y1 < 0.0 && row_start > 0 {
            y1 += self.size_row(row_start - 1);
            row_start -= 1;
        }
        x1 = x1.max(0.0);
        y1 = y1.max(0.0);

        let mut x_abs = if self.col_size_changed {
            (0..col_start).map(|col| self.size_col(col)).sum::<f64>()
        } else {
            self.default_col_pixels as f64 * col_start as f64
        };
        x_abs += x1;

        let mut y_abs = if self.row_size_changed {
            (0..row_start).map(|row| self.size_row(row)).sum::<f64>()
        } else {
            self.default_row_pixels as f64 * row_start as f64
        };
        y_abs += y1;

        while x1 >= self.size_col(col_start) && col_start < COL_MAX - 1 {
            x1 -= self.size_col(col_start);
            col_start += 1;
        }
        while y1 >= self.size_row(row_start) && row_start < ROW_MAX - 1 {
            y1 -= self.size_row(row_start);
            row_start += 1;
        }

        let mut col_end = col_start;
        let mut row_end = row_start;

        // Hidden start cells don't shift the object.
        if self.size_col(col_start) > 0.0 {
            width += x1;
        }
        if self.size_row(row_start) > 0.0 {
            height += y1;
        }

        while width >= self.size_col(col_end) && col_end < COL_MAX - 1 {
            width -= self.size_col(col_end);
            col_end += 1;
        }
        while height >= self.size_row(row_end) && row_end < ROW_MAX - 1 {
            height -= self.size_row(row_end);
            row_end += 1;
        }

        let from = DrawingCoords {
            col: col_start as u32,
            row: row_start,
            col_offset: x1,
            row_offset: y1,
        };
        let to = DrawingCoords { col: col_end as u32, row: row_end, col_offset: width, row_offset: height };
        (from, to, x_abs, y_abs)
    }

    fn position_object_emus(&self, position: &ObjectPosition, anchor_type: AnchorType) -> DrawingObject {
        let (mut from, mut to, x_abs, y_abs) = self.position_object_pixels(position);

        from.col_offset *= EMU_PER_PIXEL;
        from.row_offset *= EMU_PER_PIXEL;
        to.col_offset = to.col_offset * EMU_PER_PIXEL + 0.5;
        to.row_offset = to.row_offset * EMU_PER_PIXEL + 0.5;

        DrawingObject {
            anchor_type,
            edit_as: AnchorEditAs::OneCell,
            from,
            to,
            col_absolute: (x_abs * EMU_PER_PIXEL) as u64,
            row_absolute: (y_abs * EMU_PER_PIXEL) as u64,
            width: (0.5 + position.width * EMU_PER_PIXEL) as u32,
            height: (0.5 + position.height * EMU_PER_PIXEL) as u32,
            description: String::new(),
        }
    }

    // ------------------------------------------------------------------
    // Tab state
    // ------------------------------------------------------------------

    pub fn select(&mut self) {
        self.selected = true;
        self.hidden = false;
    }

    /// Make this the tab shown when the file opens.
    pub fn activate(&mut self) {
        self.selected = true;
        self.hidden = false;
        self.tabs.active.set(self.index);
    }

    pub fn hide(&mut self) {
        self.hidden = true;
        self.selected = false;

        if self.tabs.active.get() == self.index {
            self.tabs.active.set(0);
        }
        if self.tabs.first.get() == self.index {
            self.tabs.first.set(0);
        }
    }

    /// Leftmost visible tab when there are more tabs than fit.
    pub fn set_first_sheet(&mut self) {
        self.hidden = false;
        self.tabs.first.set(self.index);
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        if selected {
            self.hidden = false;
        }
    }

    // ------------------------------------------------------------------
    // View settings
    // ------------------------------------------------------------------

    pub fn freeze_panes(&mut self, first_row: u32, first_col: u16) {
        self.freeze_panes_opt(first_row, first_col, first_row, first_col, 0);
    }

    /// Freeze with an explicit top-left cell for the scrolled region. A
    /// non-zero `pane_type` writes the frozen-split variant.
    pub fn freeze_panes_opt(
        &mut self,
        first_row: u32,
        first_col: u16,
        top_row: u32,
        left_col: u16,
        pane_type: u8,
    ) {
        self.panes = Some(Panes {
            pane_type: if pane_type == 0 { PaneType::Freeze } else { PaneType::FreezeSplit },
            first_row,
            first_col,
            top_row,
            left_col,
            x_split: 0.0,
            y_split: 0.0,
        });
    }

    /// Split positions in points (rows) and character widths (columns).
    pub fn split_panes(&mut self, vertical: f64, horizontal: f64) {
        self.split_panes_opt(vertical, horizontal, 0, 0);
    }

    pub fn split_panes_opt(&mut self, vertical: f64, horizontal: f64, top_row: u32, left_col: u16) {
        self.panes = Some(Panes {
            pane_type: PaneType::Split,
            first_row: 0,
            first_col: 0,
            top_row,
            left_col,
            x_split: horizontal,
            y_split: vertical,
        });
    }

    /// Selected range. Only the first call counts and a lone A1 is Excel's
    /// default, so it is not stored.
    pub fn set_selection(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<()> {
        if !self.selections.is_empty() {
            return Ok(());
        }
        if first_row == 0 && first_col == 0 && last_row == 0 && last_col == 0 {
            return Ok(());
        }

        // The active cell keeps the caller's corner so the selection can run
        // in reverse.
        let active_cell = rowcol_to_cell(first_row, first_col);
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.check_dimensions(range.last_row, range.last_col, true, true)?;

        let sqref = if range.is_single_cell() {
            rowcol_to_cell(range.first_row, range.first_col)
        } else {
            rowcol_to_range(range.first_row, range.first_col, range.last_row, range.last_col)
        };
        self.selections.push(Selection { pane: String::new(), active_cell, sqref });
        Ok(())
    }

    /// Zoom percentage, 10 to 400.
    pub fn set_zoom(&mut self, scale: u16) {
        if !(10..=400).contains(&scale) {
            warn!("set_zoom(): zoom factor {} outside range: 10 <= zoom <= 400", scale);
            return;
        }
        self.zoom = scale;
    }

    pub fn gridlines(&mut self, option: Gridlines) {
        match option {
            Gridlines::HideAll => {
                self.print_gridlines = false;
                self.screen_gridlines = false;
            }
            Gridlines::ShowScreen => self.screen_gridlines = true,
            Gridlines::ShowPrint => {
                self.print_gridlines = true;
                self.print_options_changed = true;
            }
            Gridlines::ShowAll => {
                self.screen_gridlines = true;
                self.print_gridlines = true;
                self.print_options_changed = true;
            }
        }
    }

    pub fn hide_zero(&mut self) {
        self.show_zeros = false;
    }

    pub fn right_to_left(&mut self) {
        self.right_to_left = true;
    }

    /// Tab color as `0xRRGGBB`.
    pub fn set_tab_color(&mut self, color: u32) {
        self.tab_color = Some(color);
    }

    pub fn set_page_view(&mut self) {
        self.page_view = true;
    }

    /// Outline display: symbols visible, summary rows below, summary columns
    /// to the right, automatic outline styles.
    pub fn outline_settings(
        &mut self,
        visible: bool,
        symbols_below: bool,
        symbols_right: bool,
        auto_style: bool,
    ) {
        self.outline_on = visible;
        self.outline_below = symbols_below;
        self.outline_right = symbols_right;
        self.outline_style = auto_style;
        self.outline_changed = true;
    }

    /// Default row height for the sheet. A negative height keeps the current
    /// default; `hide_unused_rows` hides every row that isn't written.
    pub fn set_default_row(&mut self, height: f64, hide_unused_rows: bool) {
        let height = if height < 0.0 { self.default_row_height } else { height };

        if height != self.default_row_height {
            self.default_row_height = height;
            self.row_size_changed = true;
        }
        if hide_unused_rows {
            self.default_row_zeroed = true;
        }
        self.default_row_set = true;
    }

    /// Protect the sheet, optionally with a password. Excel only stores a
    /// 16-bit hash, so this deters edits rather than secures anything.
    pub fn protect(&mut self, password: Option<&str>, options: Option<&ProtectionOptions>) {
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.protection.hash = format!("{:X}", hash_password(password));
        }
        if let Some(options) = options {
            self.protection.options = *options;
        }
        self.protection.is_configured = true;
    }

    // ------------------------------------------------------------------
    // Page setup
    // ------------------------------------------------------------------

    pub fn set_landscape(&mut self) {
        self.landscape = true;
        self.page_setup_changed = true;
    }

    pub fn set_portrait(&mut self) {
        self.landscape = false;
        self.page_setup_changed = true;
    }

    /// Excel paper size index, e.g. 9 for A4.
    pub fn set_paper(&mut self, paper_size: u8) {
        self.paper_size = paper_size;
        self.page_setup_changed = true;
    }

    /// Page margins in inches. Negative values keep the current margin.
    pub fn set_margins(&mut self, left: f64, right: f64, top: f64, bottom: f64) {
        if left >= 0.0 {
            self.margin_left = left;
        }
        if right >= 0.0 {
            self.margin_right = right;
        }
        if top >= 0.0 {
            self.margin_top = top;
        }
        if bottom >= 0.0 {
            self.margin_bottom = bottom;
        }
    }

    pub fn set_header(&mut self, string: &str) -> Result<()> {
        self.set_header_opt(string, None)
    }

    pub fn set_header_opt(
        &mut self,
        string: &str,
        options: Option<&HeaderFooterOptions>,
    ) -> Result<()> {
        if utf8_strlen(string) >= MAX_HEADER_FOOTER_LENGTH {
            warn!("set_header(): header string exceeds Excel's limit of 255 characters");
            return Err(XlsxError::String255LengthExceeded);
        }
        self.header = string.to_string();
        if let Some(margin) = options.map(|o| o.margin).filter(|m| *m >= 0.0) {
            self.margin_header = margin;
        }
        self.header_footer_changed = true;
        Ok(())
    }

    pub fn set_footer(&mut self, string: &str) -> Result<()> {
        self.set_footer_opt(string, None)
    }

    pub fn set_footer_opt(
        &mut self,
        string: &str,
        options: Option<&HeaderFooterOptions>,
    ) -> Result<()> {
        if utf8_strlen(string) >= MAX_HEADER_FOOTER_LENGTH {
            warn!("set_footer(): footer string exceeds Excel's limit of 255 characters");
            return Err(XlsxError::String255LengthExceeded);
        }
        self.footer = string.to_string();
        if let Some(margin) = options.map(|o| o.margin).filter(|m| *m >= 0.0) {
            self.margin_footer = margin;
        }
        self.header_footer_changed = true;
        Ok(())
    }

    /// Manual page breaks above the given rows. Row 0 is ignored.
    pub fn set_h_pagebreaks(&mut self, breaks: &[u32]) -> Result<()> {
        if breaks.len() > MAX_PAGE_BREAKS {
            warn!("set_h_pagebreaks(): more than Excel's limit of 1023 page breaks");
            return Err(XlsxError::ParameterValidation);
        }
        let mut breaks: Vec<u32> = breaks.iter().copied().filter(|b| *b > 0).collect();
        breaks.sort_unstable();
        self.hbreaks = breaks;
        Ok(())
    }

    /// Manual page breaks left of the given columns. Column 0 is ignored.
    pub fn set_v_pagebreaks(&mut self, breaks: &[u16]) -> Result<()> {
        if breaks.len() > MAX_PAGE_BREAKS {
            warn!("set_v_pagebreaks(): more than Excel's limit of 1023 page breaks");
            return Err(XlsxError::ParameterValidation);
        }
        let mut breaks: Vec<u16> = breaks.iter().copied().filter(|b| *b > 0).collect();
        breaks.sort_unstable();
        self.vbreaks = breaks;
        Ok(())
    }

    pub fn print_across(&mut self) {
        self.print_across = true;
        self.page_setup_changed = true;
    }

    pub fn center_horizontally(&mut self) {
        self.center_horizontally = true;
        self.print_options_changed = true;
    }

    pub fn center_vertically(&mut self) {
        self.center_vertically = true;
        self.print_options_changed = true;
    }

    pub fn print_row_col_headers(&mut self) {
        self.print_headers = true;
        self.print_options_changed = true;
    }

    /// Rows repeated at the top of every printed page.
    pub fn repeat_rows(&mut self, first_row: u32, last_row: u32) -> Result<()> {
        let (first_row, last_row) = if first_row > last_row {
            (last_row, first_row)
        } else {
            (first_row, last_row)
        };
        self.check_dimensions(last_row, 0, true, true)?;
        self.repeat_rows = Some((first_row, last_row));
        Ok(())
    }

    /// Columns repeated at the left of every printed page.
    pub fn repeat_columns(&mut self, first_col: u16, last_col: u16) -> Result<()> {
        let (first_col, last_col) = if first_col > last_col {
            (last_col, first_col)
        } else {
            (first_col, last_col)
        };
        self.check_dimensions(0, last_col, true, true)?;
        self.repeat_cols = Some((first_col, last_col));
        Ok(())
    }

    pub fn print_area(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<()> {
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.check_dimensions(range.last_row, range.last_col, true, true)?;

        // The whole sheet is the same as no print area.
        if range.first_row == 0
            && range.first_col == 0
            && range.last_row == ROW_MAX - 1
            && range.last_col == COL_MAX - 1
        {
            return Ok(());
        }
        self.print_area = Some(range);
        Ok(())
    }

    /// Scale the printout to fit `width` by `height` pages. 0 leaves that
    /// direction unconstrained.
    pub fn fit_to_pages(&mut self, width: u16, height: u16) {
        self.fit_page = true;
        self.fit_width = width;
        self.fit_height = height;
        self.page_setup_changed = true;
    }

    pub fn set_start_page(&mut self, start_page: u16) {
        self.page_start = start_page;
        self.page_setup_changed = true;
    }

    /// Print scale percentage, 10 to 400. Overrides `fit_to_pages`.
    pub fn set_print_scale(&mut self, scale: u16) {
        if !(10..=400).contains(&scale) {
            warn!("set_print_scale(): scale {} outside range: 10 <= scale <= 400", scale);
            return;
        }
        self.fit_page = false;
        self.print_scale = scale;
        self.page_setup_changed = true;
    }

    // ------------------------------------------------------------------
    // XML output
    // ------------------------------------------------------------------

    /// Render `xl/worksheets/sheetN.xml`. Also returns the sheet's rels,
    /// whose ids match the `r:id` attributes written here.
    pub(crate) fn assemble_xml_file(&mut self) -> Result<(Vec<u8>, Relationships)> {
        if self.optimize {
            self.write_single_row()?;
        }

        let styles = Rc::clone(&self.styles);
        let mut styles = styles.borrow_mut();
        let mut rels = Relationships::new();
        let mut writer = XmlWriter::with_capacity(4096 + self.table.len() * 128);

        writer.declaration();
        writer.start_tag(
            "worksheet",
            &[Attr::str("xmlns", SCHEMA_MAIN), Attr::str("xmlns:r", SCHEMA_RELS)],
        );

        self.write_sheet_pr(&mut writer);
        self.write_dimension(&mut writer);
        self.write_sheet_views(&mut writer);
        self.write_sheet_format_pr(&mut writer);
        self.write_cols(&mut writer, &mut styles);
        self.write_sheet_data(&mut writer, &mut styles)?;
        self.write_sheet_protection(&mut writer);
        self.write_auto_filter(&mut writer);
        self.write_merge_cells(&mut writer);
        write_data_validations(&mut writer, &self.validations);
        self.write_hyperlinks(&mut writer, &mut rels);
        self.write_print_options(&mut writer);
        self.write_page_margins(&mut writer);
        self.write_page_setup(&mut writer);
        self.write_header_footer(&mut writer);
        self.write_row_breaks(&mut writer);
        self.write_col_breaks(&mut writer);
        self.write_drawing(&mut writer, &mut rels);

        writer.end_tag("worksheet");
        Ok((writer.into_bytes(), rels))
    }

    fn write_sheet_pr(&self, writer: &mut XmlWriter) {
        if !self.fit_page && self.tab_color.is_none() && !self.outline_changed {
            return;
        }

        writer.start_tag("sheetPr", &[]);

        if let Some(color) = self.tab_color {
            writer.empty_tag("tabColor", &[Attr::str("rgb", format!("FF{:06X}", color & 0xFF_FFFF))]);
        }

        if self.outline_changed {
            let mut attrs = Vec::new();
            if self.outline_style {
                attrs.push(Attr::str("applyStyles", "1"));
            }
            if !self.outline_below {
                attrs.push(Attr::str("summaryBelow", "0"));
            }
            if !self.outline_right {
                attrs.push(Attr::str("summaryRight", "0"));
            }
            if !self.outline_on {
                attrs.push(Attr::str("showOutlineSymbols", "0"));
            }
            writer.empty_tag("outlinePr", &attrs);
        }

        if self.fit_page {
            writer.empty_tag("pageSetUpPr", &[Attr::str("fitToPage", "1")]);
        }

        writer.end_tag("sheetPr");
    }

    fn write_dimension(&self, writer: &mut XmlWriter) {
        let reference = if self.dim_rowmin == ROW_MAX {
            if self.dim_colmin == COL_MAX {
                "A1".to_string()
            } else {
                rowcol_to_range(0, self.dim_colmin, 0, self.dim_colmax)
            }
        } else {
            rowcol_to_range(self.dim_rowmin, self.dim_colmin, self.dim_rowmax, self.dim_colmax)
        };
        writer.empty_tag("dimension", &[Attr::str("ref", reference)]);
    }

    fn write_sheet_views(&self, writer: &mut XmlWriter) {
        writer.start_tag("sheetViews", &[]);

        let mut attrs = Vec::new();
        if !self.screen_gridlines {
            attrs.push(Attr::str("showGridLines", "0"));
        }
        if !self.show_zeros {
            attrs.push(Attr::str("showZeros", "0"));
        }
        if self.right_to_left {
            attrs.push(Attr::str("rightToLeft", "1"));
        }
        if self.selected {
            attrs.push(Attr::str("tabSelected", "1"));
        }
        if !self.outline_on {
            attrs.push(Attr::str("showOutlineSymbols", "0"));
        }
        if self.page_view {
            attrs.push(Attr::str("view", "pageLayout"));
        }
        if self.zoom != 100 && !self.page_view {
            attrs.push(Attr::int("zoomScale", self.zoom));
            if self.zoom_scale_normal {
                attrs.push(Attr::int("zoomScaleNormal", self.zoom));
            }
        }
        attrs.push(Attr::str("workbookViewId", "0"));

        match &self.panes {
            Some(panes) => {
                writer.start_tag("sheetView", &attrs);
                match panes.pane_type {
                    PaneType::Split => self.write_split_panes(writer, panes),
                    PaneType::Freeze | PaneType::FreezeSplit => self.write_freeze_panes(writer, panes),
                }
                writer.end_tag("sheetView");
            }
            None if !self.selections.is_empty() => {
                writer.start_tag("sheetView", &attrs);
                for selection in &self.selections {
                    write_selection(writer, selection);
                }
                writer.end_tag("sheetView");
            }
            None => writer.empty_tag("sheetView", &attrs),
        }

        writer.end_tag("sheetViews");
    }

    fn write_freeze_panes(&self, writer: &mut XmlWriter, panes: &Panes) {
        let user = self.selections.first().cloned().unwrap_or_default();
        let row = panes.first_row;
        let col = panes.first_col;
        let top_left_cell = rowcol_to_cell(panes.top_row, panes.left_col);

        let mut selections = Vec::with_capacity(3);
        let active_pane = if row > 0 && col > 0 {
            let col_cell = rowcol_to_cell(0, col);
            let row_cell = rowcol_to_cell(row, 0);
            selections.push(Selection {
                pane: "topRight".to_string(),
                active_cell: col_cell.clone(),
                sqref: col_cell,
            });
            selections.push(Selection {
                pane: "bottomLeft".to_string(),
                active_cell: row_cell.clone(),
                sqref: row_cell,
            });
            "bottomRight"
        } else if col > 0 {
            "topRight"
        } else {
            "bottomLeft"
        };
        selections.push(Selection { pane: active_pane.to_string(), ..user });

        let mut attrs = Vec::new();
        if col > 0 {
            attrs.push(Attr::int("xSplit", col));
        }
        if row > 0 {
            attrs.push(Attr::int("ySplit", row));
        }
        attrs.push(Attr::str("topLeftCell", top_left_cell));
        attrs.push(Attr::str("activePane", active_pane));
        attrs.push(Attr::str(
            "state",
            if panes.pane_type == PaneType::FreezeSplit { "frozenSplit" } else { "frozen" },
        ));
        writer.empty_tag("pane", &attrs);

        for selection in &selections {
            write_selection(writer, selection);
        }
    }

    fn write_split_panes(&self, writer: &mut XmlWriter, panes: &Panes) {
        let has_selection = !self.selections.is_empty();
        let mut user = self.selections.first().cloned().unwrap_or_default();

        // Points and character widths to twips, with Excel's fixed padding.
        let y_split = if panes.y_split > 0.0 { (20.0 * panes.y_split + 300.0) as u32 } else { 0 };
        let x_split = if panes.x_split > 0.0 { calculate_x_split_width(panes.x_split) } else { 0 };

        let (top_row, left_col) = if panes.top_row == 0 && panes.left_col == 0 {
            (
                (0.5 + (y_split as f64 - 300.0) / 20.0 / 15.0) as u32,
                (0.5 + (x_split as f64 - 390.0) / 20.0 / 3.0 / 16.0) as u16,
            )
        } else {
            (panes.top_row, panes.left_col)
        };
        let top_left_cell = rowcol_to_cell(top_row, left_col);

        if !has_selection {
            user.active_cell = top_left_cell.clone();
            user.sqref = top_left_cell.clone();
        }

        let mut selections = Vec::with_capacity(3);
        let active_pane = if y_split > 0 && x_split > 0 {
            let col_cell = rowcol_to_cell(0, left_col);
            let row_cell = rowcol_to_cell(top_row, 0);
            selections.push(Selection {
                pane: "topRight".to_string(),
                active_cell: col_cell.clone(),
                sqref: col_cell,
            });
            selections.push(Selection {
                pane: "bottomLeft".to_string(),
                active_cell: row_cell.clone(),
                sqref: row_cell,
            });
            "bottomRight"
        } else if x_split > 0 {
            "topRight"
        } else {
            "bottomLeft"
        };
        selections.push(Selection { pane: active_pane.to_string(), ..user });

        let mut attrs = Vec::new();
        if x_split > 0 {
            attrs.push(Attr::int("xSplit", x_split));
        }
        if y_split > 0 {
            attrs.push(Attr::int("ySplit", y_split));
        }
        attrs.push(Attr::str("topLeftCell", top_left_cell));
        if has_selection {
            attrs.push(Attr::str("activePane", active_pane));
        }
        writer.empty_tag("pane", &attrs);

        for selection in &selections {
            write_selection(writer, selection);
        }
    }

    fn write_sheet_format_pr(&self, writer: &mut XmlWriter) {
        let mut attrs = vec![Attr::num("defaultRowHeight", self.default_row_height)];
        if self.default_row_height != DEFAULT_ROW_HEIGHT {
            attrs.push(Attr::str("customHeight", "1"));
        }
        if self.default_row_zeroed {
            attrs.push(Attr::str("zeroHeight", "1"));
        }
        if self.outline_row_level > 0 {
            attrs.push(Attr::int("outlineLevelRow", self.outline_row_level));
        }
        if self.outline_col_level > 0 {
            attrs.push(Attr::int("outlineLevelCol", self.outline_col_level));
        }
        writer.empty_tag("sheetFormatPr", &attrs);
    }

    fn write_cols(&self, writer: &mut XmlWriter, styles: &mut StyleRegistry) {
        if !self.col_size_changed || self.col_options.is_empty() {
            return;
        }

        writer.start_tag("cols", &[]);
        for options in self.col_options.values() {
            let mut width = options.width;
            let mut custom_width = true;

            if width == DEFAULT_COL_WIDTH {
                custom_width = false;
                if options.hidden {
                    width = 0.0;
                }
            }
            if width > 0.0 {
                width = col_width_to_chars(width);
            }

            let xf_index = options.format.map(|f| styles.get_xf_index(f)).unwrap_or(0);

            let mut attrs = vec![
                Attr::int("min", options.first_col as i64 + 1),
                Attr::int("max", options.last_col as i64 + 1),
                Attr::num("width", width),
            ];
            if xf_index > 0 {
                attrs.push(Attr::int("style", xf_index));
            }
            if options.hidden {
                attrs.push(Attr::str("hidden", "1"));
            }
            if custom_width {
                attrs.push(Attr::str("customWidth", "1"));
            }
            if options.level > 0 {
                attrs.push(Attr::int("outlineLevel", options.level));
            }
            if options.collapsed {
                attrs.push(Attr::str("collapsed", "1"));
            }
            writer.empty_tag("col", &attrs);
        }
        writer.end_tag("cols");
    }

    /// Column span of every 16-row block, as Excel writes it.
    fn calculate_spans(&self) -> BTreeMap<u32, String> {
        let mut blocks: BTreeMap<u32, (u16, u16)> = BTreeMap::new();
        for (&row_num, row) in &self.table {
            let (Some((&first, _)), Some((&last, _))) =
                (row.cells.first_key_value(), row.cells.last_key_value())
            else {
                continue;
            };
            let span = blocks.entry(row_num / 16).or_insert((first, last));
            span.0 = span.0.min(first);
            span.1 = span.1.max(last);
        }
        blocks
            .into_iter()
            .map(|(block, (min, max))| (block, format!("{}:{}", min as u32 + 1, max as u32 + 1)))
            .collect()
    }

    fn write_sheet_data(&mut self, writer: &mut XmlWriter, styles: &mut StyleRegistry) -> Result<()> {
        if self.optimize {
            return self.write_optimized_sheet_data(writer);
        }

        if self.table.is_empty() {
            writer.empty_tag("sheetData", &[]);
            return Ok(());
        }

        let spans = self.calculate_spans();
        writer.start_tag("sheetData", &[]);
        for (&row_num, row) in &self.table {
            let span = if row.cells.is_empty() {
                self.default_row_set.then_some("1:1")
            } else {
                spans.get(&(row_num / 16)).map(String::as_str)
            };
            self.write_row(writer, styles, row_num, row, span);
        }
        writer.end_tag("sheetData");
        Ok(())
    }

    /// Copy the rows already flushed to the temp file into the sheet.
    fn write_optimized_sheet_data(&mut self, writer: &mut XmlWriter) -> Result<()> {
        if self.dim_rowmin == ROW_MAX {
            writer.empty_tag("sheetData", &[]);
            return Ok(());
        }

        writer.start_tag("sheetData", &[]);
        if let Some(tmpfile) = self.optimize_tmpfile.as_mut() {
            tmpfile.flush()?;
            let file = tmpfile.get_mut();
            file.seek(SeekFrom::Start(0))?;
            file.read_to_end(writer.buffer_mut())?;
        }
        writer.end_tag("sheetData");
        Ok(())
    }

    fn write_row(
        &self,
        writer: &mut XmlWriter,
        styles: &mut StyleRegistry,
        row_num: u32,
        row: &Row,
        spans: Option<&str>,
    ) {
        let height = if row.height_changed { row.height } else { self.default_row_height };
        let xf_index = row.format.map(|f| styles.get_xf_index(f)).unwrap_or(0);

        let mut attrs = vec![Attr::int("r", row_num as i64 + 1)];
        if let Some(spans) = spans {
            attrs.push(Attr::str("spans", spans));
        }
        if xf_index > 0 {
            attrs.push(Attr::int("s", xf_index));
        }
        if row.format.is_some() {
            attrs.push(Attr::str("customFormat", "1"));
        }
        if height != DEFAULT_ROW_HEIGHT {
            attrs.push(Attr::num("ht", height));
        }
        if row.hidden {
            attrs.push(Attr::str("hidden", "1"));
        }
        if height != DEFAULT_ROW_HEIGHT {
            attrs.push(Attr::str("customHeight", "1"));
        }
        if row.level > 0 {
            attrs.push(Attr::int("outlineLevel", row.level));
        }
        if row.collapsed {
            attrs.push(Attr::str("collapsed", "1"));
        }

        if row.cells.is_empty() {
            writer.empty_tag("row", &attrs);
            return;
        }

        writer.start_tag("row", &attrs);
        let buf = writer.buffer_mut();
        for (&col, cell) in &row.cells {
            let xf_index = self.cell_xf_index(styles, row, col, cell);
            write_cell(buf, row_num, col, cell, xf_index);
        }
        writer.end_tag("row");
    }

    /// Cell format first, then the row's, then the column's.
    fn cell_xf_index(&self, styles: &mut StyleRegistry, row: &Row, col: u16, cell: &Cell) -> u32 {
        let format = cell
            .format
            .or(row.format)
            .or_else(|| self.col_option(col).and_then(|options| options.format));
        format.map(|f| styles.get_xf_index(f)).unwrap_or(0)
    }

    fn write_sheet_protection(&self, writer: &mut XmlWriter) {
        let protection = &self.protection;
        if !protection.is_configured {
            return;
        }
        let options = &protection.options;

        let mut attrs = Vec::new();
        if !protection.hash.is_empty() {
            attrs.push(Attr::str("password", protection.hash.as_str()));
        }
        if !protection.no_sheet {
            attrs.push(Attr::str("sheet", "1"));
        }
        if protection.content {
            attrs.push(Attr::str("content", "1"));
        }
        if !options.objects {
            attrs.push(Attr::str("objects", "1"));
        }
        if !options.scenarios {
            attrs.push(Attr::str("scenarios", "1"));
        }

        let allowed = [
            (options.format_cells, "formatCells"),
            (options.format_columns, "formatColumns"),
            (options.format_rows, "formatRows"),
            (options.insert_columns, "insertColumns"),
            (options.insert_rows, "insertRows"),
            (options.insert_hyperlinks, "insertHyperlinks"),
            (options.delete_columns, "deleteColumns"),
            (options.delete_rows, "deleteRows"),
        ];
        for (enabled, key) in allowed {
            if enabled {
                attrs.push(Attr::str(key, "0"));
            }
        }

        if options.no_select_locked_cells {
            attrs.push(Attr::str("selectLockedCells", "1"));
        }
        if options.sort {
            attrs.push(Attr::str("sort", "0"));
        }
        if options.autofilter {
            attrs.push(Attr::str("autoFilter", "0"));
        }
        if options.pivot_tables {
            attrs.push(Attr::str("pivotTables", "0"));
        }
        if options.no_select_unlocked_cells {
            attrs.push(Attr::str("selectUnlockedCells", "1"));
        }

        writer.empty_tag("sheetProtection", &attrs);
    }

    fn write_auto_filter(&self, writer: &mut XmlWriter) {
        if let Some(range) = &self.autofilter {
            let reference =
                rowcol_to_range(range.first_row, range.first_col, range.last_row, range.last_col);
            writer.empty_tag("autoFilter", &[Attr::str("ref", reference)]);
        }
    }

    fn write_merge_cells(&self, writer: &mut XmlWriter) {
        if self.merged_ranges.is_empty() {
            return;
        }
        writer.start_tag("mergeCells", &[Attr::int("count", self.merged_ranges.len() as i64)]);
        for range in &self.merged_ranges {
            let reference =
                rowcol_to_range(range.first_row, range.first_col, range.last_row, range.last_col);
            writer.empty_tag("mergeCell", &[Attr::str("ref", reference)]);
        }
        writer.end_tag("mergeCells");
    }

    fn write_hyperlinks(&self, writer: &mut XmlWriter, rels: &mut Relationships) {
        if self.hyperlinks.is_empty() {
            return;
        }

        writer.start_tag("hyperlinks", &[]);
        for (&(row, col), link) in &self.hyperlinks {
            let mut attrs = vec![Attr::str("ref", rowcol_to_cell(row, col))];
            match link.link_type {
                HyperlinkType::Url | HyperlinkType::External => {
                    rels.add_worksheet_relationship("/hyperlink", &link.target, Some("External"));
                    attrs.push(Attr::str("r:id", format!("rId{}", rels.len())));
                    if let Some(location) = &link.location {
                        attrs.push(Attr::str("location", location.as_str()));
                    }
                    if let Some(tooltip) = &link.tooltip {
                        attrs.push(Attr::str("tooltip", tooltip.as_str()));
                    }
                }
                HyperlinkType::Internal => {
                    attrs.push(Attr::str("location", link.target.as_str()));
                    if let Some(tooltip) = &link.tooltip {
                        attrs.push(Attr::str("tooltip", tooltip.as_str()));
                    }
                    if let Some(display) = &link.location {
                        attrs.push(Attr::str("display", display.as_str()));
                    }
                }
            }
            writer.empty_tag("hyperlink", &attrs);
        }
        writer.end_tag("hyperlinks");
    }

    fn write_print_options(&self, writer: &mut XmlWriter) {
        if !self.print_options_changed {
            return;
        }
        let mut attrs = Vec::new();
        if self.center_horizontally {
            attrs.push(Attr::str("horizontalCentered", "1"));
        }
        if self.center_vertically {
            attrs.push(Attr::str("verticalCentered", "1"));
        }
        if self.print_headers {
            attrs.push(Attr::str("headings", "1"));
        }
        if self.print_gridlines {
            attrs.push(Attr::str("gridLines", "1"));
        }
        writer.empty_tag("printOptions", &attrs);
    }

    fn write_page_margins(&self, writer: &mut XmlWriter) {
        writer.empty_tag(
            "pageMargins",
            &[
                Attr::num("left", self.margin_left),
                Attr::num("right", self.margin_right),
                Attr::num("top", self.margin_top),
                Attr::num("bottom", self.margin_bottom),
                Attr::num("header", self.margin_header),
                Attr::num("footer", self.margin_footer),
            ],
        );
    }

    fn write_page_setup(&self, writer: &mut XmlWriter) {
        if !self.page_setup_changed {
            return;
        }

        let mut attrs = Vec::new();
        if self.paper_size > 0 {
            attrs.push(Attr::int("paperSize", self.paper_size));
        }
        if self.print_scale != 100 {
            attrs.push(Attr::int("scale", self.print_scale));
        }
        if self.fit_page && self.fit_width != 1 {
            attrs.push(Attr::int("fitToWidth", self.fit_width));
        }
        if self.fit_page && self.fit_height != 1 {
            attrs.push(Attr::int("fitToHeight", self.fit_height));
        }
        if self.print_across {
            attrs.push(Attr::str("pageOrder", "overThenDown"));
        }
        if self.page_start > 1 {
            attrs.push(Attr::int("firstPageNumber", self.page_start));
        }
        attrs.push(Attr::str("orientation", if self.landscape { "landscape" } else { "portrait" }));
        if self.page_start > 0 {
            attrs.push(Attr::str("useFirstPageNumber", "1"));
        }
        writer.empty_tag("pageSetup", &attrs);
    }

    fn write_header_footer(&self, writer: &mut XmlWriter) {
        if !self.header_footer_changed {
            return;
        }
        writer.start_tag("headerFooter", &[]);
        if !self.header.is_empty() {
            writer.data_element("oddHeader", &self.header, &[]);
        }
        if !self.footer.is_empty() {
            writer.data_element("oddFooter", &self.footer, &[]);
        }
        writer.end_tag("headerFooter");
    }

    fn write_row_breaks(&self, writer: &mut XmlWriter) {
        write_breaks(writer, "rowBreaks", self.hbreaks.iter().map(|b| *b as i64), COL_MAX as i64 - 1);
    }

    fn write_col_breaks(&self, writer: &mut XmlWriter) {
        write_breaks(writer, "colBreaks", self.vbreaks.iter().map(|b| *b as i64), ROW_MAX as i64 - 1);
    }

    fn write_drawing(&self, writer: &mut XmlWriter, rels: &mut Relationships) {
        let Some(link) = &self.drawing_link else {
            return;
        };
        rels.add_worksheet_relationship("/drawing", link, None);
        writer.empty_tag("drawing", &[Attr::str("r:id", format!("rId{}", rels.len()))]);
    }
}

fn write_selection(writer: &mut XmlWriter, selection: &Selection) {
    let mut attrs = Vec::new();
    if !selection.pane.is_empty() {
        attrs.push(Attr::str("pane", selection.pane.as_str()));
    }
    if !selection.active_cell.is_empty() {
        attrs.push(Attr::str("activeCell", selection.active_cell.as_str()));
    }
    if !selection.sqref.is_empty() {
        attrs.push(Attr::str("sqref", selection.sqref.as_str()));
    }
    writer.empty_tag("selection", &attrs);
}

fn write_breaks(
    writer: &mut XmlWriter,
    tag: &str,
    breaks: impl ExactSizeIterator<Item = i64>,
    max: i64,
) {
    let count = breaks.len() as i64;
    if count == 0 {
        return;
    }
    writer.start_tag(tag, &[Attr::int("count", count), Attr::int("manualBreakCount", count)]);
    for id in breaks {
        writer.empty_tag(
            "brk",
            &[Attr::int("id", id), Attr::int("max", max), Attr::str("man", "1")],
        );
    }
    writer.end_tag(tag);
}

/// Append one `<c>` element. `xf_index` 0 is the default style and is left
/// out.
#[inline(always)]
fn write_cell(buf: &mut Vec<u8>, row: u32, col: u16, cell: &Cell, xf_index: u32) {
    buf.extend_from_slice(b"<c r=\"");
    write_cell_ref(row, col, buf);
    buf.push(b'"');
    if xf_index > 0 {
        buf.extend_from_slice(b" s=\"");
        buf.extend_from_slice(itoa::Buffer::new().format(xf_index).as_bytes());
        buf.push(b'"');
    }

    match &cell.value {
        CellValue::Number(number) => {
            buf.extend_from_slice(b"><v>");
            write_f64(buf, *number);
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::String(index) => {
            buf.extend_from_slice(b" t=\"s\"><v>");
            buf.extend_from_slice(itoa::Buffer::new().format(*index).as_bytes());
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::InlineString(string) => {
            buf.extend_from_slice(b" t=\"inlineStr\"><is><t");
            if needs_space_preserve(string) {
                buf.extend_from_slice(b" xml:space=\"preserve\"");
            }
            buf.push(b'>');
            escape_data_into(string.as_bytes(), buf);
            buf.extend_from_slice(b"</t></is></c>");
        }
        CellValue::Formula { formula, result } => {
            buf.extend_from_slice(b"><f>");
            escape_data_into(formula.as_bytes(), buf);
            buf.extend_from_slice(b"</f><v>");
            write_f64(buf, *result);
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::ArrayFormula { formula, range, result } => {
            buf.extend_from_slice(b"><f t=\"array\" ref=\"");
            escape_attr_into(range.as_bytes(), buf);
            buf.extend_from_slice(b"\">");
            escape_data_into(formula.as_bytes(), buf);
            buf.extend_from_slice(b"</f><v>");
            write_f64(buf, *result);
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::Blank => buf.extend_from_slice(b"/>"),
        CellValue::Boolean(value) => {
            buf.extend_from_slice(b" t=\"b\"><v>");
            buf.push(if *value { b'1' } else { b'0' });
            buf.extend_from_slice(b"</v></c>");
        }
    }
}

/// Percent-encode the characters Excel rejects in a URL, unless the URL
/// already carries escapes.
fn escape_url(url: &str) -> String {
    let already_escaped = url
        .as_bytes()
        .windows(3)
        .any(|w| w[0] == b'%' && w[1].is_ascii_hexdigit() && w[2].is_ascii_hexdigit());
    if already_escaped {
        return url.to_string();
    }

    let mut escaped = String::with_capacity(url.len() + 8);
    for c in url.chars() {
        match c {
            ' ' | '"' | '%' | '<' | '>' | '[' | ']' | '`' | '^' | '{' | '}' => {
                escaped.push_str(&format!("%{:02x}", c as u32));
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

fn check_finite(value: f64, caller: &str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        warn!("{}(): number {} cannot be stored in a cell", caller, value);
        Err(XlsxError::ParameterValidation)
    }
}

fn col_width_to_pixels(width: f64) -> u32 {
    if width < 1.0 {
        (width * (MAX_DIGIT_WIDTH + CELL_PADDING) + 0.5) as u32
    } else {
        (width * MAX_DIGIT_WIDTH + 0.5) as u32 + CELL_PADDING as u32
    }
}

/// User width to the character width stored in `<col>`, truncated to
/// 1/256ths the way Excel does.
fn col_width_to_chars(width: f64) -> f64 {
    let pixels = if width < 1.0 {
        (width * (MAX_DIGIT_WIDTH + CELL_PADDING) + 0.5) as u16 as f64
    } else {
        (width * MAX_DIGIT_WIDTH + 0.5) as u16 as f64 + CELL_PADDING
    };
    (pixels / MAX_DIGIT_WIDTH * 256.0) as u16 as f64 / 256.0
}

/// Horizontal split position in twips for a width in character units.
fn calculate_x_split_width(width: f64) -> u32 {
    let pixels = col_width_to_pixels(width);
    let points = pixels * 3 / 4;
    let twips = points * 20;
    twips + 390
}

/// Excel's legacy 16-bit sheet password hash.
fn hash_password(password: &str) -> u16 {
    let bytes = password.as_bytes();
    let mut hash: u16 = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let letter = (byte as u32).wrapping_shl(i as u32 + 1);
        let low_15 = letter & 0x7FFF;
        let high_15 = (letter & (0x7FFF << 15)) >> 15;
        hash ^= (low_15 | high_15) as u16;
    }

    hash ^= bytes.len() as u16;
    hash ^ 0xCE4B
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chart::ChartType;
    use crate::format::Format;
    use crate::validation::{ValidationCriteria, ValidationType};
    use pretty_assertions::assert_eq;

    pub(crate) struct Fixture {
        pub sst: Rc<RefCell<SharedStringTable>>,
        pub styles: Rc<RefCell<StyleRegistry>>,
        pub tabs: Rc<SheetTabs>,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            Self {
                sst: Rc::new(RefCell::new(SharedStringTable::new())),
                styles: Rc::new(RefCell::new(StyleRegistry::new())),
                tabs: Rc::new(SheetTabs::default()),
            }
        }

        pub(crate) fn sheet(&self, name: &str, index: u16, optimize: bool) -> Worksheet {
            let default_url_format = self.styles.borrow_mut().register_format(Format::new().set_hyperlink());
            Worksheet::new(WorksheetInit {
                name: name.to_string(),
                index,
                optimize,
                tmpdir: None,
                date_1904: false,
                sst: Rc::clone(&self.sst),
                styles: Rc::clone(&self.styles),
                default_url_format,
                tabs: Rc::clone(&self.tabs),
            })
            .unwrap()
        }
    }

    fn sheet_xml(sheet: &mut Worksheet) -> String {
        String::from_utf8(sheet.assemble_xml_file().unwrap().0).unwrap()
    }

    /// The part between `<sheetData>` tags, or the empty element.
    fn sheet_data(xml: &str) -> &str {
        let start = xml.find("<sheetData").unwrap();
        let end = xml.find("</sheetData>").map(|e| e + "</sheetData>".len());
        match end {
            Some(end) => &xml[start..end],
            None => &xml[start..start + "<sheetData/>".len()],
        }
    }

    #[test]
    fn test_empty_sheet() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.select();

        assert_eq!(
            sheet_xml(&mut sheet),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
             <dimension ref=\"A1\"/>\
             <sheetViews><sheetView tabSelected=\"1\" workbookViewId=\"0\"/></sheetViews>\
             <sheetFormatPr defaultRowHeight=\"15\"/>\
             <sheetData/>\
             <pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>\
             </worksheet>"
        );
    }

    #[test]
    fn test_cells_and_spans() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let bold = fixture.styles.borrow_mut().register_format(Format::new().set_bold());

        sheet.write_number(0, 0, 1.5, None).unwrap();
        sheet.write_string(0, 3, "Hello", Some(bold)).unwrap();
        sheet.write_boolean(17, 1, true, None).unwrap();
        sheet.write_formula_num(17, 2, "=SUM(A1:A2)", None, 3.0).unwrap();

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains("<dimension ref=\"A1:D18\"/>"));
        assert_eq!(
            sheet_data(&xml),
            "<sheetData>\
             <row r=\"1\" spans=\"1:4\"><c r=\"A1\"><v>1.5</v></c><c r=\"D1\" s=\"1\" t=\"s\"><v>0</v></c></row>\
             <row r=\"18\" spans=\"2:3\"><c r=\"B18\" t=\"b\"><v>1</v></c><c r=\"C18\"><f>SUM(A1:A2)</f><v>3</v></c></row>\
             </sheetData>"
        );
    }

    #[test]
    fn test_dimension_is_order_independent() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.write_number(5, 2, 1.0, None).unwrap();
        sheet.write_number(1, 9, 1.0, None).unwrap();

        assert_eq!(sheet.dimensions(), Some((1, 2, 5, 9)));
        assert!(sheet_xml(&mut sheet).contains("<dimension ref=\"C2:J6\"/>"));
    }

    #[test]
    fn test_row_and_column_limits() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);

        assert!(matches!(
            sheet.write_number(ROW_MAX, 0, 1.0, None),
            Err(XlsxError::WorksheetIndexOutOfRange)
        ));
        assert!(matches!(
            sheet.write_string(0, COL_MAX, "x", None),
            Err(XlsxError::WorksheetIndexOutOfRange)
        ));
        assert_eq!(sheet.dimensions(), None);

        sheet.write_number(ROW_MAX - 1, COL_MAX - 1, 1.0, None).unwrap();
        assert_eq!(sheet.dimensions(), Some((ROW_MAX - 1, COL_MAX - 1, ROW_MAX - 1, COL_MAX - 1)));
    }

    #[test]
    fn test_string_rules() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);

        let long = "x".repeat(MAX_STRING_LENGTH + 1);
        assert!(matches!(
            sheet.write_string(0, 0, &long, None),
            Err(XlsxError::MaxStringLengthExceeded)
        ));

        // Empty without a format stores nothing.
        sheet.write_string(0, 0, "", None).unwrap();
        assert_eq!(sheet.dimensions(), None);

        sheet.write_string(0, 0, "same", None).unwrap();
        sheet.write_string(1, 0, "same", None).unwrap();
        let sst = fixture.sst.borrow();
        assert_eq!((sst.string_count(), sst.unique_count()), (2, 1));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(sheet.write_number(0, 0, value, None), Err(XlsxError::ParameterValidation)));
            assert!(matches!(
                sheet.write_formula_num(0, 1, "=1/0", None, value),
                Err(XlsxError::ParameterValidation)
            ));
            assert!(matches!(
                sheet.write_array_formula_num(0, 2, 1, 2, "{=A1:A2}", None, value),
                Err(XlsxError::ParameterValidation)
            ));
        }
        assert_eq!(sheet.dimensions(), None);

        sheet.write_number(0, 0, -0.5, None).unwrap();
        assert!(sheet_xml(&mut sheet).contains("<c r=\"A1\"><v>-0.5</v></c>"));
    }

    #[test]
    fn test_blank_needs_format() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let format = fixture.styles.borrow_mut().register_format(Format::new().set_italic());

        sheet.write_blank(0, 0, None).unwrap();
        sheet.write_blank(0, 1, Some(format)).unwrap();
        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains("<row r=\"1\" spans=\"2:2\"><c r=\"B1\" s=\"1\"/></row>"));
    }

    #[test]
    fn test_array_formula() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.write_array_formula(2, 0, 0, 0, "{=SUM(B1:C1*B2:C2)}", None).unwrap();

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains(
            "<c r=\"A1\"><f t=\"array\" ref=\"A1:A3\">SUM(B1:C1*B2:C2)</f><v>0</v></c>"
        ));
        assert!(xml.contains("<c r=\"A3\"><v>0</v></c>"));

        sheet.write_array_formula(4, 4, 4, 4, "{=1+1}", None).unwrap();
        assert!(sheet_xml(&mut sheet).contains("<f t=\"array\" ref=\"E5\">1+1</f>"));
    }

    #[test]
    fn test_datetime_uses_serial() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.write_datetime(0, 0, &DateTime::new(2008, 1, 1, 12, 0, 0.0), None).unwrap();
        assert!(sheet_xml(&mut sheet).contains("<c r=\"A1\"><v>39448.5</v></c>"));
    }

    #[test]
    fn test_merge_range() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let format = fixture.styles.borrow_mut().register_format(Format::new().set_bold());

        assert!(matches!(
            sheet.merge_range(1, 1, 1, 1, "one", Some(format)),
            Err(XlsxError::ParameterValidation)
        ));
        assert_eq!(sheet.dimensions(), None);
        assert_eq!(fixture.sst.borrow().string_count(), 0);

        sheet.merge_range(1, 2, 1, 1, "Merged", Some(format)).unwrap();
        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains(
            "<row r=\"2\" spans=\"2:3\"><c r=\"B2\" s=\"1\" t=\"s\"><v>0</v></c><c r=\"C2\" s=\"1\"/></row>"
        ));
        assert!(xml.contains("<mergeCells count=\"1\"><mergeCell ref=\"B2:C2\"/></mergeCells>"));
    }

    #[test]
    fn test_set_row_and_column() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let format = fixture.styles.borrow_mut().register_format(Format::new().set_bold());

        sheet.set_column(3, 1, 10.0, None).unwrap();
        sheet.set_column_opt(5, 5, 8.43, None, &RowColOptions { hidden: true, level: 9, collapsed: false })
            .unwrap();
        sheet.set_row(0, 30.0, None).unwrap();
        sheet.set_row(2, 0.0, Some(format)).unwrap();
        sheet.write_number(2, 0, 5.0, None).unwrap();

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains("<sheetFormatPr defaultRowHeight=\"15\" outlineLevelCol=\"7\"/>"));
        assert!(xml.contains(
            "<cols><col min=\"2\" max=\"4\" width=\"10.7109375\" customWidth=\"1\"/>\
             <col min=\"6\" max=\"6\" width=\"0\" hidden=\"1\" outlineLevel=\"7\"/></cols>"
        ));
        assert!(xml.contains("<row r=\"1\" ht=\"30\" customHeight=\"1\"/>"));
        // Row format flows down to cells without their own.
        assert!(xml.contains(
            "<row r=\"3\" spans=\"1:1\" s=\"1\" customFormat=\"1\" hidden=\"1\"><c r=\"A3\" s=\"1\"><v>5</v></c></row>"
        ));
    }

    #[test]
    fn test_column_format_applies_to_cells() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let format = fixture.styles.borrow_mut().register_format(Format::new().set_italic());

        sheet.set_column(0, 4, 12.0, Some(format)).unwrap();
        sheet.write_number(0, 2, 1.0, None).unwrap();
        sheet.write_number(0, 6, 1.0, None).unwrap();

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains("<c r=\"C1\" s=\"1\"><v>1</v></c><c r=\"G1\"><v>1</v></c>"));
        assert!(xml.contains("style=\"1\""));
    }

    #[test]
    fn test_constant_memory_rows() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, true);

        sheet.write_string(0, 0, " padded", None).unwrap();
        sheet.write_number(0, 1, 2.0, None).unwrap();
        sheet.write_number(3, 0, 4.0, None).unwrap();

        assert!(matches!(
            sheet.write_number(1, 0, 1.0, None),
            Err(XlsxError::WorksheetIndexOutOfRange)
        ));
        // Same row is still writable.
        sheet.write_number(3, 2, 5.0, None).unwrap();

        assert_eq!(fixture.sst.borrow().string_count(), 0);
        let xml = sheet_xml(&mut sheet);
        assert_eq!(
            sheet_data(&xml),
            "<sheetData>\
             <row r=\"1\"><c r=\"A1\" t=\"inlineStr\"><is><t xml:space=\"preserve\"> padded</t></is></c><c r=\"B1\"><v>2</v></c></row>\
             <row r=\"4\"><c r=\"A4\"><v>4</v></c><c r=\"C4\"><v>5</v></c></row>\
             </sheetData>"
        );
        assert!(xml.contains("<dimension ref=\"A1:C4\"/>"));
    }

    #[test]
    fn test_constant_memory_empty_sheet() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, true);
        assert!(sheet.is_constant_memory());
        assert_eq!(sheet_data(&sheet_xml(&mut sheet)), "<sheetData/>");
    }

    #[test]
    fn test_control_characters_inline() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, true);
        sheet.write_string(0, 0, "a\u{1}b", None).unwrap();
        assert!(sheet_xml(&mut sheet).contains("<t>a_x0001_b</t>"));
    }

    #[test]
    fn test_freeze_panes() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.freeze_panes(1, 0);
        assert!(sheet_xml(&mut sheet).contains(
            "<sheetView workbookViewId=\"0\"><pane ySplit=\"1\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"frozen\"/>\
             <selection pane=\"bottomLeft\"/></sheetView>"
        ));

        let mut sheet = fixture.sheet("Sheet2", 1, false);
        sheet.freeze_panes(2, 1);
        sheet.set_selection(4, 4, 4, 4).unwrap();
        assert!(sheet_xml(&mut sheet).contains(
            "<pane xSplit=\"1\" ySplit=\"2\" topLeftCell=\"B3\" activePane=\"bottomRight\" state=\"frozen\"/>\
             <selection pane=\"topRight\" activeCell=\"B1\" sqref=\"B1\"/>\
             <selection pane=\"bottomLeft\" activeCell=\"A3\" sqref=\"A3\"/>\
             <selection pane=\"bottomRight\" activeCell=\"E5\" sqref=\"E5\"/>"
        ));
    }

    #[test]
    fn test_split_panes() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.split_panes(15.0, 8.43);
        assert!(sheet_xml(&mut sheet).contains(
            "<pane xSplit=\"1350\" ySplit=\"600\" topLeftCell=\"B2\"/>\
             <selection pane=\"topRight\" activeCell=\"B1\" sqref=\"B1\"/>\
             <selection pane=\"bottomLeft\" activeCell=\"A2\" sqref=\"A2\"/>\
             <selection pane=\"bottomRight\" activeCell=\"B2\" sqref=\"B2\"/>"
        ));
    }

    #[test]
    fn test_selection_keeps_direction() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.set_selection(0, 0, 0, 0).unwrap();
        sheet.set_selection(5, 3, 1, 1).unwrap();
        sheet.set_selection(9, 9, 9, 9).unwrap();
        assert!(sheet_xml(&mut sheet)
            .contains("<sheetView workbookViewId=\"0\"><selection activeCell=\"D6\" sqref=\"B2:D6\"/></sheetView>"));
    }

    #[test]
    fn test_urls() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);

        sheet.write_url(0, 0, "https://example.com/a b", None).unwrap();
        sheet.write_url_opt(1, 0, "internal:Sheet2!A1", None, Some("Go"), Some("tip")).unwrap();
        sheet.write_url(2, 0, "external:c:/temp/foo.xlsx#Sheet1!A1", None).unwrap();
        sheet.write_url(3, 0, "mailto:jmcnamara@cpan.org", None).unwrap();
        assert!(matches!(sheet.write_url(4, 0, "", None), Err(XlsxError::NullParameterIgnored)));

        let (xml, rels) = sheet.assemble_xml_file().unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains(
            "<hyperlinks>\
             <hyperlink ref=\"A1\" r:id=\"rId1\"/>\
             <hyperlink ref=\"A2\" location=\"Sheet2!A1\" tooltip=\"tip\" display=\"Go\"/>\
             <hyperlink ref=\"A3\" r:id=\"rId2\" location=\"Sheet1!A1\"/>\
             <hyperlink ref=\"A4\" r:id=\"rId3\"/>\
             </hyperlinks>"
        ));

        let rels = String::from_utf8(rels.assemble_xml_file()).unwrap();
        assert!(rels.contains("Target=\"https://example.com/a%20b\" TargetMode=\"External\""));
        assert!(rels.contains("Target=\"file:///c:\\temp\\foo.xlsx\""));
        assert!(rels.contains("Target=\"mailto:jmcnamara@cpan.org\""));

        // Default display text, stored through the shared string table.
        let sst = fixture.sst.borrow();
        assert_eq!(sst.get(0), Some("https://example.com/a b"));
        assert_eq!(sst.get(1), Some("Go"));
        assert_eq!(sst.get(2), Some("c:\\temp\\foo.xlsx#Sheet1!A1"));
        assert_eq!(sst.get(3), Some("jmcnamara@cpan.org"));
    }

    #[test]
    fn test_url_too_long() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let url = format!("https://example.com/{}", "x".repeat(255));
        assert!(matches!(
            sheet.write_url(0, 0, &url, None),
            Err(XlsxError::String255LengthExceeded)
        ));
        assert_eq!(sheet.dimensions(), None);
    }

    #[test]
    fn test_escape_url() {
        assert_eq!(escape_url("http://a.com/[x] {y}"), "http://a.com/%5bx%5d%20%7by%7d");
        assert_eq!(escape_url("http://a.com/%20already"), "http://a.com/%20already");
        assert_eq!(escape_url("http://a.com/\"q\"<^>`"), "http://a.com/%22q%22%3c%5e%3e%60");
    }

    #[test]
    fn test_protection() {
        assert_eq!(format!("{:X}", hash_password("password")), "83AF");

        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let options = ProtectionOptions { format_cells: true, insert_rows: true, no_select_locked_cells: true, ..Default::default() };
        sheet.protect(Some("password"), Some(&options));
        assert!(sheet_xml(&mut sheet).contains(
            "<sheetProtection password=\"83AF\" sheet=\"1\" objects=\"1\" scenarios=\"1\" \
             formatCells=\"0\" insertRows=\"0\" selectLockedCells=\"1\"/>"
        ));
    }

    #[test]
    fn test_page_setup_and_printing() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.set_landscape();
        sheet.set_paper(9);
        sheet.fit_to_pages(1, 0);
        sheet.set_start_page(2);
        sheet.set_margins(0.5, -1.0, 1.0, 1.0);
        sheet.set_header("&CPage &P").unwrap();
        sheet.set_footer_opt("&LDraft", Some(&HeaderFooterOptions { margin: 0.5 })).unwrap();
        sheet.center_horizontally();
        sheet.gridlines(Gridlines::ShowAll);
        sheet.set_h_pagebreaks(&[20, 10]).unwrap();
        sheet.set_v_pagebreaks(&[3]).unwrap();

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains("<sheetPr><pageSetUpPr fitToPage=\"1\"/></sheetPr>"));
        assert!(xml.contains("<printOptions horizontalCentered=\"1\" gridLines=\"1\"/>"));
        assert!(xml.contains(
            "<pageMargins left=\"0.5\" right=\"0.7\" top=\"1\" bottom=\"1\" header=\"0.3\" footer=\"0.5\"/>"
        ));
        assert!(xml.contains(
            "<pageSetup paperSize=\"9\" fitToHeight=\"0\" firstPageNumber=\"2\" orientation=\"landscape\" useFirstPageNumber=\"1\"/>"
        ));
        assert!(xml.contains(
            "<headerFooter><oddHeader>&amp;CPage &amp;P</oddHeader><oddFooter>&amp;LDraft</oddFooter></headerFooter>"
        ));
        assert!(xml.contains(
            "<rowBreaks count=\"2\" manualBreakCount=\"2\"><brk id=\"10\" max=\"16383\" man=\"1\"/><brk id=\"20\" max=\"16383\" man=\"1\"/></rowBreaks>\
             <colBreaks count=\"1\" manualBreakCount=\"1\"><brk id=\"3\" max=\"1048575\" man=\"1\"/></colBreaks>"
        ));
    }

    #[test]
    fn test_page_break_and_header_limits() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.set_h_pagebreaks(&[5]).unwrap();
        let too_many: Vec<u32> = (1..=1024).collect();
        assert!(matches!(sheet.set_h_pagebreaks(&too_many), Err(XlsxError::ParameterValidation)));
        assert_eq!(sheet.hbreaks, vec![5]);

        assert!(matches!(
            sheet.set_header(&"h".repeat(255)),
            Err(XlsxError::String255LengthExceeded)
        ));
        assert!(!sheet.header_footer_changed);
    }

    #[test]
    fn test_view_options() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.set_zoom(5);
        sheet.set_zoom(150);
        sheet.hide_zero();
        sheet.right_to_left();
        sheet.gridlines(Gridlines::HideAll);
        sheet.set_tab_color(0xFF0000);
        sheet.outline_settings(false, false, true, false);

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains(
            "<sheetPr><tabColor rgb=\"FFFF0000\"/><outlinePr summaryBelow=\"0\" showOutlineSymbols=\"0\"/></sheetPr>"
        ));
        assert!(xml.contains(
            "<sheetView showGridLines=\"0\" showZeros=\"0\" rightToLeft=\"1\" showOutlineSymbols=\"0\" \
             zoomScale=\"150\" zoomScaleNormal=\"150\" workbookViewId=\"0\"/>"
        ));
    }

    #[test]
    fn test_default_row() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.set_default_row(24.0, true);
        sheet.set_row(1, 24.0, None).unwrap();
        sheet.write_number(3, 0, 1.0, None).unwrap();

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains("<sheetFormatPr defaultRowHeight=\"24\" customHeight=\"1\" zeroHeight=\"1\"/>"));
        assert!(xml.contains("<row r=\"2\" spans=\"1:1\" ht=\"24\" customHeight=\"1\"/>"));
        assert!(xml.contains("<row r=\"4\" spans=\"1:1\" ht=\"24\" customHeight=\"1\">"));
    }

    #[test]
    fn test_tab_state() {
        let fixture = Fixture::new();
        let mut first = fixture.sheet("Sheet1", 0, false);
        let mut second = fixture.sheet("Sheet2", 1, false);

        second.activate();
        assert_eq!(fixture.tabs.active.get(), 1);
        assert!(second.is_selected());

        second.set_first_sheet();
        assert_eq!(fixture.tabs.first.get(), 1);

        second.hide();
        assert!(second.is_hidden() && !second.is_selected());
        assert_eq!((fixture.tabs.active.get(), fixture.tabs.first.get()), (0, 0));

        first.select();
        assert!(first.is_selected());
    }

    #[test]
    fn test_autofilter_and_print_ranges() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);

        assert!(matches!(sheet.autofilter(0, 0, 0, 0), Err(XlsxError::ParameterValidation)));
        sheet.autofilter(10, 3, 0, 0).unwrap();
        sheet.repeat_rows(3, 0).unwrap();
        sheet.repeat_columns(2, 1).unwrap();
        sheet.print_area(0, 0, ROW_MAX - 1, COL_MAX - 1).unwrap();
        assert!(sheet.print_area.is_none());
        sheet.print_area(0, 0, 9, 4).unwrap();

        assert_eq!(sheet.repeat_rows, Some((0, 3)));
        assert_eq!(sheet.repeat_cols, Some((1, 2)));
        assert_eq!(sheet.print_area, Some(CellRange::new(0, 0, 9, 4)));
        assert!(sheet_xml(&mut sheet).contains("<autoFilter ref=\"A1:D11\"/>"));
        // Filters and print ranges don't count as data.
        assert_eq!(sheet.dimensions(), None);
    }

    #[test]
    fn test_data_validation() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);

        let validation = DataValidation {
            validate: ValidationType::Integer,
            criteria: ValidationCriteria::Between,
            minimum_number: 1.0,
            maximum_number: 10.0,
            ..Default::default()
        };
        sheet.data_validation_range(4, 1, 2, 1, &validation).unwrap();
        sheet.data_validation_cell(0, 0, &DataValidation::default()).unwrap();

        let xml = sheet_xml(&mut sheet);
        assert!(xml.contains("<dataValidations count=\"1\">"));
        assert!(xml.contains("sqref=\"B3:B5\""));
    }

    #[test]
    fn test_image_anchor_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, crate::image::tests::png_bytes(64, 20, None)).unwrap();

        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.insert_image(0, 0, &path).unwrap();
        sheet.prepare_image(0, 1, 1);

        let drawing = sheet.drawing().unwrap();
        let object = &drawing.objects[0];
        assert_eq!(object.description, "logo.png");
        assert_eq!((object.from.col, object.from.row), (0, 0));
        assert_eq!((object.to.col, object.to.row), (1, 1));
        assert_eq!((object.to.col_offset as u32, object.to.row_offset as u32), (0, 0));
        assert_eq!((object.width, object.height), (609_600, 190_500));

        let rels = String::from_utf8(sheet.drawing_rels().assemble_xml_file()).unwrap();
        assert!(rels.contains("Target=\"../media/image1.png\""));

        let xml = sheet_xml(&mut sheet);
        assert!(xml.ends_with("<drawing r:id=\"rId1\"/></worksheet>"));
    }

    #[test]
    fn test_image_offsets_and_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        std::fs::write(&path, crate::image::tests::png_bytes(100, 40, None)).unwrap();

        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        let options = ImageOptions { x_offset: 70, y_offset: -5, x_scale: 2.0, y_scale: 0.0 };
        sheet.insert_image_opt(2, 1, &path, &options).unwrap();
        sheet.prepare_image(0, 3, 2);

        let object = &sheet.drawing().unwrap().objects[0];
        // 70px into B spills into C; -5px walks back into row 2.
        assert_eq!((object.from.col, object.from.col_offset), (2, 6.0 * 9525.0));
        assert_eq!((object.from.row, object.from.row_offset), (1, 15.0 * 9525.0));
        assert_eq!(object.col_absolute, 134 * 9525);
        assert_eq!(object.row_absolute, 35 * 9525);
        assert_eq!((object.width, object.height), (200 * 9525, 40 * 9525));
    }

    #[test]
    fn test_missing_image() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        assert!(matches!(
            sheet.insert_image(0, 0, "/no/such/file.png"),
            Err(XlsxError::ParameterValidation)
        ));
    }

    #[test]
    fn test_insert_chart_requires_series() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        assert!(matches!(
            sheet.insert_chart(0, 0, Chart::new(ChartType::Column)),
            Err(XlsxError::ParameterValidation)
        ));

        let mut chart = Chart::new(ChartType::Column);
        chart.add_series(None, Some("=Sheet1!$A$1:$A$3")).unwrap();
        sheet.insert_chart(1, 2, chart).unwrap();
        sheet.prepare_chart(0, 1, 1);

        let object = &sheet.drawing().unwrap().objects[0];
        assert_eq!(object.anchor_type, AnchorType::Chart);
        assert_eq!((object.from.col, object.from.row), (2, 1));
        assert_eq!((object.to.col, object.to.row), (9, 15));

        let rels = String::from_utf8(sheet.drawing_rels().assemble_xml_file()).unwrap();
        assert!(rels.contains("Target=\"../charts/chart1.xml\""));
    }

    #[test]
    fn test_chart_data_points() {
        let fixture = Fixture::new();
        let mut sheet = fixture.sheet("Sheet1", 0, false);
        sheet.write_number(0, 0, 7.0, None).unwrap();
        sheet.write_string(1, 0, "label", None).unwrap();
        sheet.write_formula(2, 0, "=A1", None).unwrap();

        assert_eq!(sheet.chart_data_point(0, 0), DataPoint::Number(7.0));
        assert_eq!(sheet.chart_data_point(1, 0), DataPoint::String("label".to_string()));
        assert_eq!(sheet.chart_data_point(2, 0), DataPoint::Number(0.0));
        assert_eq!(sheet.chart_data_point(3, 0), DataPoint::NoData);
    }

    #[test]
    fn test_column_width_conversion() {
        assert_eq!(col_width_to_chars(10.0), 10.7109375);
        assert_eq!(col_width_to_chars(0.5), 0.85546875);
        assert_eq!(calculate_x_split_width(8.43), 1350);
    }
}

use std::cell::RefCell;
use std::mem;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};

use crate::chart::{ChartRange, RangeState};
use crate::doc_props::{CustomProperty, CustomPropertyValue, DocProperties};
use crate::error::{Result, XlsxError};
use crate::format::{Format, Underline};
use crate::packager;
use crate::shared_strings::SharedStringTable;
use crate::styles::{FormatId, StyleRegistry};
use crate::utility::{col_to_name, quote_sheetname, rowcol_to_range_abs, utf8_strlen, COL_MAX, ROW_MAX};
use crate::validation::{validate_sheet_name, write_file_atomic};
use crate::worksheet::{SheetTabs, Worksheet, WorksheetInit};
use crate::xml::{Attr, XmlWriter};

const SCHEMA_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const SCHEMA_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const MAX_DEFINED_NAME_LENGTH: usize = 128;
const MAX_PROPERTY_LENGTH: usize = 255;

/// Workbook-wide settings fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct WorkbookOptions {
    /// Flush each row to a temp file as soon as a later row is written.
    pub constant_memory: bool,
    /// Directory for constant-memory temp files; the system default when unset.
    pub tmpdir: Option<PathBuf>,
    /// Count dates from 1904-01-01 instead of 1900-01-01.
    pub date_1904: bool,
}

impl WorkbookOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_constant_memory(mut self, enable: bool) -> Self {
        self.constant_memory = enable;
        self
    }

    pub fn set_tmpdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmpdir = Some(dir.into());
        self
    }

    pub fn set_date_1904(mut self, enable: bool) -> Self {
        self.date_1904 = enable;
        self
    }
}

/// A workbook-global or sheet-scoped name, kept in Excel's display order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DefinedName {
    pub name: String,
    /// Title listed under "Named Ranges" in `docProps/app.xml`.
    pub app_name: String,
    pub formula: String,
    /// Sheet index of a local name.
    pub scope: Option<u16>,
    pub hidden: bool,
    sort_name: String,
    sort_scope: String,
}

impl DefinedName {
    fn sort_key(&self) -> (&str, &str) {
        (&self.sort_name, &self.sort_scope)
    }
}

/// The root object: owns the worksheets, the format table, the shared
/// string table and the workbook-level names and properties. Nothing touches
/// the disk until [`Workbook::close`].
///
/// ```no_run
/// use xlsxcore::{Format, Workbook};
///
/// # fn main() -> xlsxcore::Result<()> {
/// let mut workbook = Workbook::new("report.xlsx");
/// let bold = workbook.add_format(Format::new().set_bold());
///
/// let sheet = workbook.add_worksheet(None)?;
/// sheet.write_string(0, 0, "Total", Some(bold))?;
/// sheet.write_number(0, 1, 42.0, None)?;
///
/// workbook.close()
/// # }
/// ```
pub struct Workbook {
    path: PathBuf,
    options: WorkbookOptions,
    pub(crate) worksheets: Vec<Worksheet>,
    pub(crate) sst: Rc<RefCell<SharedStringTable>>,
    pub(crate) styles: Rc<RefCell<StyleRegistry>>,
    tabs: Rc<SheetTabs>,
    default_url_format: FormatId,
    pub(crate) defined_names: Vec<DefinedName>,
    pub(crate) properties: DocProperties,
    pub(crate) custom_properties: Vec<CustomProperty>,
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("worksheets", &self.worksheets)
            .field("defined_names", &self.defined_names.len())
            .finish_non_exhaustive()
    }
}

impl Workbook {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::new_with_options(path, WorkbookOptions::default())
    }

    pub fn new_with_options(path: impl AsRef<Path>, options: WorkbookOptions) -> Self {
        let mut styles = StyleRegistry::new();
        let default_url_format = styles.register_format(
            Format::new().set_underline(Underline::Single).set_theme(10).set_hyperlink(),
        );

        Self {
            path: path.as_ref().to_path_buf(),
            options,
            worksheets: Vec::new(),
            sst: Rc::new(RefCell::new(SharedStringTable::new())),
            styles: Rc::new(RefCell::new(styles)),
            tabs: Rc::new(SheetTabs::default()),
            default_url_format,
            defined_names: Vec::new(),
            properties: DocProperties::default(),
            custom_properties: Vec::new(),
        }
    }

    pub fn options(&self) -> &WorkbookOptions {
        &self.options
    }

    /// Append a worksheet. Without a name it becomes `Sheet{n}`, n counting
    /// from 1 over all sheets added so far.
    pub fn add_worksheet(&mut self, name: Option<&str>) -> Result<&mut Worksheet> {
        let index = self.worksheets.len();
        let name = match name {
            Some(name) => {
                validate_sheet_name(name)?;
                name.to_string()
            }
            None => format!("Sheet{}", index + 1),
        };

        if self.get_worksheet_by_name(&name).is_some() {
            return Err(XlsxError::SheetnameAlreadyUsed);
        }
        let index = u16::try_from(index).map_err(|_| XlsxError::ParameterValidation)?;

        let worksheet = Worksheet::new(WorksheetInit {
            name,
            index,
            optimize: self.options.constant_memory,
            tmpdir: self.options.tmpdir.clone(),
            date_1904: self.options.date_1904,
            sst: Rc::clone(&self.sst),
            styles: Rc::clone(&self.styles),
            default_url_format: self.default_url_format,
            tabs: Rc::clone(&self.tabs),
        })?;
        debug!("add_worksheet(): '{}' at index {}", worksheet.name(), index);

        self.worksheets.push(worksheet);
        let last = self.worksheets.len() - 1;
        Ok(&mut self.worksheets[last])
    }

    /// Register a format for use in cell, row and column writes.
    pub fn add_format(&mut self, format: Format) -> FormatId {
        self.styles.borrow_mut().register_format(format)
    }

    /// Blue underlined style applied to `write_url` cells without a format.
    pub fn get_default_url_format(&self) -> FormatId {
        self.default_url_format
    }

    pub fn get_worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|worksheet| worksheet.name() == name)
    }

    pub fn get_worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|worksheet| worksheet.name() == name)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.worksheets
    }

    /// Define a name such as `Exchange_rate` for `=0.96`, or a sheet-local
    /// `Sheet2!Sales` for `=Sheet2!$G$1:$H$10`. Redefining an existing name
    /// in the same scope keeps the first definition.
    pub fn define_name(&mut self, name: &str, formula: &str) -> Result<()> {
        self.store_defined_name(name, None, formula, None, false)
    }

    fn store_defined_name(
        &mut self,
        name: &str,
        app_name: Option<&str>,
        formula: &str,
        scope: Option<u16>,
        hidden: bool,
    ) -> Result<()> {
        if name.is_empty() || formula.is_empty() {
            return Err(XlsxError::NullParameterIgnored);
        }
        if utf8_strlen(name) > MAX_DEFINED_NAME_LENGTH || utf8_strlen(formula) > MAX_DEFINED_NAME_LENGTH {
            return Err(XlsxError::String128LengthExceeded);
        }

        let (local_name, scope, sheet_name) = match name.split_once('!') {
            None => (name, scope, String::new()),
            Some((sheet, local)) => {
                let sheet = sheet.strip_prefix('\'').unwrap_or(sheet);
                let sheet = sheet.strip_suffix('\'').unwrap_or(sheet);
                let Some(worksheet) = self.get_worksheet_by_name(sheet) else {
                    warn!("define_name(): worksheet '{}' in name '{}' doesn't exist.", sheet, name);
                    return Err(XlsxError::ParameterValidation);
                };
                (local, Some(worksheet.index()), sheet.to_string())
            }
        };

        let (app_name, sort_scope) = match app_name {
            Some(app_name) => (app_name.to_string(), app_name.to_lowercase()),
            None => (name.to_string(), sheet_name.to_lowercase()),
        };

        let defined_name = DefinedName {
            name: local_name.to_string(),
            app_name,
            formula: formula.strip_prefix('=').unwrap_or(formula).to_string(),
            scope,
            hidden,
            sort_name: local_name.strip_prefix("_xlnm.").unwrap_or(local_name).to_lowercase(),
            sort_scope,
        };

        match self
            .defined_names
            .binary_search_by(|existing| existing.sort_key().cmp(&defined_name.sort_key()))
        {
            Ok(_) => {
                debug!("define_name(): '{}' already defined, keeping the first", name);
            }
            Err(position) => self.defined_names.insert(position, defined_name),
        }
        Ok(())
    }

    /// Replace the document summary properties.
    pub fn set_properties(&mut self, properties: &DocProperties) {
        self.properties = properties.clone();
    }

    pub fn set_custom_property_string(&mut self, name: &str, value: &str) -> Result<()> {
        if utf8_strlen(value) > MAX_PROPERTY_LENGTH {
            warn!("set_custom_property_string(): value exceeds 255 characters");
            return Err(XlsxError::String255LengthExceeded);
        }
        self.add_custom_property(name, CustomPropertyValue::String(value.to_string()))
    }

    pub fn set_custom_property_number(&mut self, name: &str, value: f64) -> Result<()> {
        self.add_custom_property(name, CustomPropertyValue::Number(value))
    }

    pub fn set_custom_property_integer(&mut self, name: &str, value: i32) -> Result<()> {
        self.add_custom_property(name, CustomPropertyValue::Integer(value))
    }

    pub fn set_custom_property_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        self.add_custom_property(name, CustomPropertyValue::Boolean(value))
    }

    pub fn set_custom_property_datetime(&mut self, name: &str, value: DateTime<Utc>) -> Result<()> {
        self.add_custom_property(name, CustomPropertyValue::Datetime(value))
    }

    fn add_custom_property(&mut self, name: &str, value: CustomPropertyValue) -> Result<()> {
        if name.is_empty() {
            return Err(XlsxError::NullParameterIgnored);
        }
        if utf8_strlen(name) > MAX_PROPERTY_LENGTH {
            warn!("custom property name '{}' exceeds 255 characters", name);
            return Err(XlsxError::String255LengthExceeded);
        }

        self.custom_properties.push(CustomProperty { name: name.to_string(), value });
        Ok(())
    }

    /// Run the preparation passes and write the package to the workbook
    /// path. The file is replaced only when every part was written.
    pub fn close(mut self) -> Result<()> {
        if self.worksheets.is_empty() {
            self.add_worksheet(None)?;
        }

        if self.tabs.active.get() == 0 {
            if let Some(first) = self.worksheets.first_mut() {
                first.set_selected(true);
            }
        }

        self.prepare_defined_names()?;
        self.prepare_drawings();
        self.populate_chart_caches();

        let path = self.path.clone();
        debug!("close(): writing '{}'", path.display());

        write_file_atomic(&path, |file| packager::create_package(&mut self, file)).map_err(|e| {
            error!("close(): error creating '{}': {}", path.display(), e);
            e
        })
    }

    /// Hidden filter database, print area and print title names for every
    /// sheet that sets them.
    fn prepare_defined_names(&mut self) -> Result<()> {
        let mut names = Vec::new();

        for worksheet in &self.worksheets {
            let quoted = quote_sheetname(worksheet.name());
            let scope = Some(worksheet.index());

            if let Some(filter) = worksheet.autofilter {
                let area =
                    rowcol_to_range_abs(filter.first_row, filter.first_col, filter.last_row, filter.last_col);
                names.push((
                    "_xlnm._FilterDatabase",
                    format!("{}!_FilterDatabase", quoted),
                    format!("{}!{}", quoted, area),
                    scope,
                    true,
                ));
            }

            if let Some(print_area) = worksheet.print_area {
                let area = if print_area.first_row == 0 && print_area.last_row == ROW_MAX - 1 {
                    format!(
                        "${}:${}",
                        col_to_name(print_area.first_col, false),
                        col_to_name(print_area.last_col, false)
                    )
                } else if print_area.first_col == 0 && print_area.last_col == COL_MAX - 1 {
                    format!("${}:${}", print_area.first_row + 1, print_area.last_row + 1)
                } else {
                    rowcol_to_range_abs(
                        print_area.first_row,
                        print_area.first_col,
                        print_area.last_row,
                        print_area.last_col,
                    )
                };
                names.push((
                    "_xlnm.Print_Area",
                    format!("{}!Print_Area", quoted),
                    format!("{}!{}", quoted, area),
                    scope,
                    false,
                ));
            }

            let cols = worksheet.repeat_cols.map(|(first, last)| {
                format!("{}!${}:${}", quoted, col_to_name(first, false), col_to_name(last, false))
            });
            let rows = worksheet
                .repeat_rows
                .map(|(first, last)| format!("{}!${}:${}", quoted, first + 1, last + 1));
            let titles = match (cols, rows) {
                (Some(cols), Some(rows)) => Some(format!("{},{}", cols, rows)),
                (cols, rows) => cols.or(rows),
            };
            if let Some(titles) = titles {
                names.push(("_xlnm.Print_Titles", format!("{}!Print_Titles", quoted), titles, scope, false));
            }
        }

        for (name, app_name, formula, scope, hidden) in names {
            self.store_defined_name(name, Some(&app_name), &formula, scope, hidden)?;
        }
        Ok(())
    }

    /// Number charts and images across the workbook and give every sheet
    /// with embedded objects its drawing.
    fn prepare_drawings(&mut self) {
        let mut chart_ref_id = 0;
        let mut image_ref_id = 0;
        let mut drawing_id = 0;

        for worksheet in &mut self.worksheets {
            if worksheet.images.is_empty() && worksheet.charts.is_empty() {
                continue;
            }
            drawing_id += 1;

            for chart_index in 0..worksheet.charts.len() {
                chart_ref_id += 1;
                worksheet.prepare_chart(chart_index, chart_ref_id, drawing_id);
            }
            for image_index in 0..worksheet.images.len() {
                image_ref_id += 1;
                worksheet.prepare_image(image_index, image_ref_id, drawing_id);
            }
        }
    }

    /// Read every chart range back from the worksheets so the chart parts
    /// carry cached values.
    fn populate_chart_caches(&mut self) {
        for sheet_index in 0..self.worksheets.len() {
            let mut charts = mem::take(&mut self.worksheets[sheet_index].charts);
            for object in &mut charts {
                for range in object.chart.ranges_mut() {
                    self.populate_range(range);
                }
            }
            self.worksheets[sheet_index].charts = charts;
        }
    }

    fn populate_range(&self, range: &mut ChartRange) {
        range.resolve_dimensions(|name| self.get_worksheet_by_name(name).is_some());
        if range.state() != RangeState::DimensionsResolved {
            return;
        }

        let Some(worksheet) = range.sheetname().and_then(|name| self.get_worksheet_by_name(name)) else {
            warn!(
                "chart range '{}' refers to a worksheet that doesn't exist",
                range.formula().unwrap_or_default()
            );
            range.ignore_cache();
            return;
        };

        if worksheet.is_constant_memory() || !range.is_cacheable() {
            range.ignore_cache();
            return;
        }

        let Some((first_row, first_col, last_row, last_col)) = range.dimensions() else {
            return;
        };
        let points = if first_col == last_col {
            (first_row..=last_row).map(|row| worksheet.chart_data_point(row, first_col)).collect()
        } else {
            (first_col..=last_col).map(|col| worksheet.chart_data_point(first_row, col)).collect()
        };
        range.set_cache(points);
    }

    /// `xl/workbook.xml`.
    pub(crate) fn assemble_xml_file(&self) -> Vec<u8> {
        let mut writer = XmlWriter::with_capacity(1024 + self.worksheets.len() * 64 + self.defined_names.len() * 96);
        writer.declaration();
        writer.start_tag("workbook", &[Attr::str("xmlns", SCHEMA_MAIN), Attr::str("xmlns:r", SCHEMA_RELS)]);

        writer.empty_tag(
            "fileVersion",
            &[
                Attr::str("appName", "xl"),
                Attr::str("lastEdited", "4"),
                Attr::str("lowestEdited", "4"),
                Attr::str("rupBuild", "4505"),
            ],
        );

        let mut workbook_pr = Vec::with_capacity(2);
        if self.options.date_1904 {
            workbook_pr.push(Attr::str("date1904", "1"));
        }
        workbook_pr.push(Attr::str("defaultThemeVersion", "124226"));
        writer.empty_tag("workbookPr", &workbook_pr);

        let mut view = vec![
            Attr::str("xWindow", "240"),
            Attr::str("yWindow", "15"),
            Attr::str("windowWidth", "16095"),
            Attr::str("windowHeight", "9660"),
        ];
        let first_sheet = self.tabs.first.get();
        let active_sheet = self.tabs.active.get();
        if first_sheet > 0 {
            view.push(Attr::int("firstSheet", first_sheet));
        }
        if active_sheet > 0 {
            view.push(Attr::int("activeTab", active_sheet));
        }
        writer.start_tag("bookViews", &[]);
        writer.empty_tag("workbookView", &view);
        writer.end_tag("bookViews");

        writer.start_tag("sheets", &[]);
        for worksheet in &self.worksheets {
            let sheet_id = u32::from(worksheet.index()) + 1;
            let r_id = format!("rId{}", sheet_id);
            let mut attrs = vec![Attr::str("name", worksheet.name()), Attr::int("sheetId", sheet_id)];
            if worksheet.is_hidden() {
                attrs.push(Attr::str("state", "hidden"));
            }
            attrs.push(Attr::str("r:id", r_id));
            writer.empty_tag("sheet", &attrs);
        }
        writer.end_tag("sheets");

        if !self.defined_names.is_empty() {
            writer.start_tag("definedNames", &[]);
            for defined_name in &self.defined_names {
                let mut attrs = vec![Attr::str("name", defined_name.name.as_str())];
                if let Some(scope) = defined_name.scope {
                    attrs.push(Attr::int("localSheetId", scope));
                }
                if defined_name.hidden {
                    attrs.push(Attr::int("hidden", 1));
                }
                writer.data_element("definedName", &defined_name.formula, &attrs);
            }
            writer.end_tag("definedNames");
        }

        writer.empty_tag("calcPr", &[Attr::str("calcId", "124519"), Attr::str("fullCalcOnLoad", "1")]);
        writer.end_tag("workbook");
        writer.into_bytes()
    }

    /// Titles listed under "Named Ranges" in `docProps/app.xml`: names that
    /// point into a sheet, except the hidden filter databases.
    pub(crate) fn named_range_titles(&self) -> Vec<String> {
        self.defined_names
            .iter()
            .filter(|name| name.formula.contains('!') && !name.app_name.contains("_FilterDatabase"))
            .map(|name| name.app_name.clone())
            .collect()
    }
}

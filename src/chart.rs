use log::warn;

use crate::error::{Result, XlsxError};
use crate::utility::{
    name_to_col, name_to_col_2, name_to_row, name_to_row_2, rowcol_to_formula_abs, COL_MAX, ROW_MAX,
};
use crate::xml::{format_f64, Attr, XmlWriter};

const SCHEMA_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006";
const SCHEMA_OFFICEDOC_RELS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const DEFAULT_STYLE_ID: u8 = 2;
const DEFAULT_HOLE_SIZE: u8 = 50;
const DEFAULT_GAP: u16 = 501;
const AXIS_ID_BASE: u32 = 50_010_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    Area,
    AreaStacked,
    AreaStackedPercent,
    Bar,
    BarStacked,
    BarStackedPercent,
    Column,
    ColumnStacked,
    ColumnStackedPercent,
    Doughnut,
    Line,
    Pie,
    Scatter,
    ScatterStraight,
    ScatterStraightWithMarkers,
    ScatterSmooth,
    ScatterSmoothWithMarkers,
    Radar,
    RadarWithMarkers,
    RadarFilled,
}

/// Family a chart type is written as. Subtypes only change grouping,
/// defaults and a couple of style attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartGroup {
    Area,
    Bar,
    Column,
    Doughnut,
    Line,
    Pie,
    Scatter,
    Radar,
}

impl ChartType {
    fn group(self) -> ChartGroup {
        use ChartType::*;
        match self {
            Area | AreaStacked | AreaStackedPercent => ChartGroup::Area,
            Bar | BarStacked | BarStackedPercent => ChartGroup::Bar,
            Column | ColumnStacked | ColumnStackedPercent => ChartGroup::Column,
            Doughnut => ChartGroup::Doughnut,
            Line => ChartGroup::Line,
            Pie => ChartGroup::Pie,
            Scatter
            | ScatterStraight
            | ScatterStraightWithMarkers
            | ScatterSmooth
            | ScatterSmoothWithMarkers => ChartGroup::Scatter,
            Radar | RadarWithMarkers | RadarFilled => ChartGroup::Radar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    Clustered,
    Standard,
    PercentStacked,
    Stacked,
}

impl Grouping {
    fn xml_val(self) -> &'static str {
        match self {
            Grouping::Clustered => "clustered",
            Grouping::Standard => "standard",
            Grouping::PercentStacked => "percentStacked",
            Grouping::Stacked => "stacked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPosition {
    None,
    #[default]
    Right,
    Left,
    Top,
    Bottom,
    OverlayRight,
    OverlayLeft,
}

/// Side of the plot area an axis is drawn on. Reversing the opposite axis
/// flips it to the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPosition {
    Right,
    Left,
    Top,
    Bottom,
}

impl AxisPosition {
    fn flipped(self) -> Self {
        match self {
            AxisPosition::Right => AxisPosition::Left,
            AxisPosition::Left => AxisPosition::Right,
            AxisPosition::Top => AxisPosition::Bottom,
            AxisPosition::Bottom => AxisPosition::Top,
        }
    }

    fn xml_val(self) -> &'static str {
        match self {
            AxisPosition::Right => "r",
            AxisPosition::Left => "l",
            AxisPosition::Top => "t",
            AxisPosition::Bottom => "b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisLabelPosition {
    #[default]
    NextTo,
    High,
    Low,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMark {
    None,
    Inside,
    Outside,
    Crossing,
}

impl TickMark {
    fn xml_val(self) -> &'static str {
        match self {
            TickMark::None => "none",
            TickMark::Inside => "in",
            TickMark::Outside => "out",
            TickMark::Crossing => "cross",
        }
    }
}

/// Whether a category axis crosses the value axis on or between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisBetween {
    OnTick,
    Between,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlanksAs {
    #[default]
    Gap,
    Zero,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerType {
    Automatic,
    None,
    Square,
    Diamond,
    Triangle,
    X,
    Star,
    ShortDash,
    LongDash,
    Circle,
    Plus,
}

impl MarkerType {
    fn xml_val(self) -> &'static str {
        match self {
            MarkerType::Square => "square",
            MarkerType::Diamond => "diamond",
            MarkerType::Triangle => "triangle",
            MarkerType::X => "x",
            MarkerType::Star => "star",
            MarkerType::ShortDash => "short_dash",
            MarkerType::LongDash => "long_dash",
            MarkerType::Circle => "circle",
            MarkerType::Plus => "plus",
            MarkerType::Automatic | MarkerType::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChartMarker {
    pub marker_type: Option<MarkerType>,
    pub size: u8,
}

/// Line properties for a series. Width is in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLine {
    pub color: Option<u32>,
    pub width: f64,
    pub none: bool,
}

impl Default for ChartLine {
    fn default() -> Self {
        Self { color: None, width: 2.25, none: false }
    }
}

/// Progress of a range through cache resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeState {
    #[default]
    Unresolved,
    DimensionsResolved,
    CachePopulated,
    Ignored,
}

/// One cached value read back from a worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum DataPoint {
    Number(f64),
    String(String),
    NoData,
}

/// A series, title or axis-name reference. Either set from a formula like
/// `Sheet1!$A$1:$A$5` or from explicit coordinates, in which case the
/// dimensions are known up front.
#[derive(Debug, Clone, Default)]
pub struct ChartRange {
    pub(crate) formula: Option<String>,
    pub(crate) sheetname: Option<String>,
    pub(crate) first_row: u32,
    pub(crate) first_col: u16,
    pub(crate) last_row: u32,
    pub(crate) last_col: u16,
    pub(crate) state: RangeState,
    pub(crate) data_cache: Vec<DataPoint>,
    pub(crate) has_string_cache: bool,
}

impl ChartRange {
    fn from_formula(formula: &str) -> Self {
        Self {
            formula: Some(formula.strip_prefix('=').unwrap_or(formula).to_string()),
            ..Self::default()
        }
    }

    fn set(&mut self, sheetname: &str, first_row: u32, first_col: u16, last_row: u32, last_col: u16) {
        *self = Self {
            formula: Some(rowcol_to_formula_abs(sheetname, first_row, first_col, last_row, last_col)),
            sheetname: Some(sheetname.to_string()),
            first_row,
            first_col,
            last_row,
            last_col,
            state: RangeState::DimensionsResolved,
            ..Self::default()
        };
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn state(&self) -> RangeState {
        self.state
    }

    pub fn data_cache(&self) -> &[DataPoint] {
        &self.data_cache
    }

    pub fn sheetname(&self) -> Option<&str> {
        self.sheetname.as_deref()
    }

    /// `(first_row, first_col, last_row, last_col)` once dimensions are known.
    pub fn dimensions(&self) -> Option<(u32, u16, u32, u16)> {
        match self.state {
            RangeState::DimensionsResolved | RangeState::CachePopulated => {
                Some((self.first_row, self.first_col, self.last_row, self.last_col))
            }
            _ => None,
        }
    }

    /// Parse the formula into a sheet name and rectangle. `has_sheet` checks
    /// the name against the workbook.
    pub(crate) fn resolve_dimensions(&mut self, has_sheet: impl Fn(&str) -> bool) {
        if self.state != RangeState::Unresolved {
            return;
        }

        let Some(formula) = self.formula.as_deref() else {
            self.state = RangeState::Ignored;
            return;
        };

        // Non-contiguous ranges like (Sheet1!$A$1,Sheet1!$A$3).
        if formula.starts_with('(') {
            self.state = RangeState::Ignored;
            return;
        }

        let Some((sheet, cells)) = formula.rsplit_once('!') else {
            self.state = RangeState::Ignored;
            return;
        };

        let sheet = sheet.strip_prefix('\'').unwrap_or(sheet);
        let sheet = sheet.strip_suffix('\'').unwrap_or(sheet).replace("''", "'");
        if !has_sheet(&sheet) {
            warn!(
                "add_chart(): worksheet name '{}' in chart formula '{}' doesn't exist.",
                sheet, formula
            );
            self.state = RangeState::Ignored;
            return;
        }

        let (first_row, first_col) = (name_to_row(cells), name_to_col(cells));
        let (last_row, last_col) = if cells.contains(':') {
            (name_to_row_2(cells), name_to_col_2(cells))
        } else {
            (first_row, first_col)
        };

        let in_bounds = |row: u32, col: u32| row < ROW_MAX && col < u32::from(COL_MAX);
        let (Some(first_col), Some(last_col)) = (
            u16::try_from(first_col).ok().filter(|_| in_bounds(first_row, first_col)),
            u16::try_from(last_col).ok().filter(|_| in_bounds(last_row, last_col)),
        ) else {
            warn!("add_chart(): range '{}' in chart formula '{}' is outside the worksheet.", cells, formula);
            self.state = RangeState::Ignored;
            return;
        };

        self.first_row = first_row;
        self.first_col = first_col;
        self.last_row = last_row;
        self.last_col = last_col;
        self.sheetname = Some(sheet);
        self.state = RangeState::DimensionsResolved;
    }

    /// Only single-row or single-column ranges are cached.
    pub(crate) fn is_cacheable(&self) -> bool {
        self.state == RangeState::DimensionsResolved
            && (self.first_row == self.last_row || self.first_col == self.last_col)
    }

    pub(crate) fn ignore_cache(&mut self) {
        self.state = RangeState::Ignored;
        self.data_cache.clear();
        self.has_string_cache = false;
    }

    pub(crate) fn set_cache(&mut self, points: Vec<DataPoint>) {
        self.has_string_cache = points.iter().any(|p| matches!(p, DataPoint::String(_)));
        self.data_cache = points;
        self.state = RangeState::CachePopulated;
    }
}

/// Chart, axis or series title: literal text or a cell reference.
#[derive(Debug, Clone, Default)]
pub struct ChartTitle {
    pub(crate) name: Option<String>,
    pub(crate) range: ChartRange,
    pub(crate) off: bool,
}

impl ChartTitle {
    /// A leading `=` makes `name` a cell reference.
    fn set_name(&mut self, name: &str) {
        if name.starts_with('=') {
            self.range = ChartRange::from_formula(name);
        } else {
            self.name = Some(name.to_string());
        }
    }

    fn set_name_range(&mut self, sheetname: &str, row: u32, col: u16) {
        self.range.set(sheetname, row, col, row, col);
    }

    pub fn range(&self) -> &ChartRange {
        &self.range
    }
}

#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub(crate) categories: ChartRange,
    pub(crate) values: ChartRange,
    pub(crate) title: ChartTitle,
    pub(crate) smooth: bool,
    pub(crate) marker: Option<ChartMarker>,
    pub(crate) line: Option<ChartLine>,
}

impl ChartSeries {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.title.set_name(name);
        self
    }

    pub fn set_name_range(&mut self, sheetname: &str, row: u32, col: u16) -> &mut Self {
        self.title.set_name_range(sheetname, row, col);
        self
    }

    pub fn set_categories(
        &mut self,
        sheetname: &str,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> &mut Self {
        self.categories.set(sheetname, first_row, first_col, last_row, last_col);
        self
    }

    pub fn set_values(
        &mut self,
        sheetname: &str,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> &mut Self {
        self.values.set(sheetname, first_row, first_col, last_row, last_col);
        self
    }

    /// Only line and scatter charts draw smoothed lines.
    pub fn set_smooth(&mut self, smooth: bool) -> &mut Self {
        self.smooth = smooth;
        self
    }

    pub fn set_marker_type(&mut self, marker_type: MarkerType) -> &mut Self {
        self.marker.get_or_insert_with(ChartMarker::default).marker_type = Some(marker_type);
        self
    }

    pub fn set_marker_size(&mut self, size: u8) -> &mut Self {
        self.marker.get_or_insert_with(ChartMarker::default).size = size;
        self
    }

    pub fn set_line(&mut self, line: ChartLine) -> &mut Self {
        self.line = Some(line);
        self
    }

    pub fn categories(&self) -> &ChartRange {
        &self.categories
    }

    pub fn values(&self) -> &ChartRange {
        &self.values
    }

    pub fn title(&self) -> &ChartTitle {
        &self.title
    }

    pub(crate) fn ranges_mut(&mut self) -> [&mut ChartRange; 3] {
        [&mut self.categories, &mut self.values, &mut self.title.range]
    }
}

#[derive(Debug, Clone)]
pub struct ChartAxis {
    pub(crate) title: ChartTitle,
    num_format: Option<String>,
    default_num_format: String,
    reverse: bool,
    hidden: bool,
    min: Option<f64>,
    max: Option<f64>,
    log_base: Option<u16>,
    major_gridlines: bool,
    minor_gridlines: bool,
    major_tick_mark: Option<TickMark>,
    minor_tick_mark: Option<TickMark>,
    label_position: AxisLabelPosition,
    axis_position: AxisPosition,
    position_axis: Option<AxisBetween>,
    crossing: Option<f64>,
    crossing_max: bool,
    is_category: bool,
    is_value: bool,
}

impl ChartAxis {
    fn new(axis_position: AxisPosition, major_gridlines: bool) -> Self {
        Self {
            title: ChartTitle::default(),
            num_format: None,
            default_num_format: "General".to_string(),
            reverse: false,
            hidden: false,
            min: None,
            max: None,
            log_base: None,
            major_gridlines,
            minor_gridlines: false,
            major_tick_mark: None,
            minor_tick_mark: None,
            label_position: AxisLabelPosition::NextTo,
            axis_position,
            position_axis: None,
            crossing: None,
            crossing_max: false,
            is_category: false,
            is_value: false,
        }
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.title.set_name(name);
        self
    }

    pub fn set_name_range(&mut self, sheetname: &str, row: u32, col: u16) -> &mut Self {
        self.title.set_name_range(sheetname, row, col);
        self
    }

    pub fn set_num_format(&mut self, num_format: &str) -> &mut Self {
        self.num_format = Some(num_format.to_string());
        self
    }

    pub fn set_reverse(&mut self) -> &mut Self {
        self.reverse = true;
        self
    }

    pub fn set_min(&mut self, min: f64) -> &mut Self {
        if !self.is_value {
            warn!("set_min(): only valid for value axes");
        }
        self.min = Some(min);
        self
    }

    pub fn set_max(&mut self, max: f64) -> &mut Self {
        if !self.is_value {
            warn!("set_max(): only valid for value axes");
        }
        self.max = Some(max);
        self
    }

    /// Ignored outside 2..=1000.
    pub fn set_log_base(&mut self, log_base: u16) -> &mut Self {
        if (2..=1000).contains(&log_base) {
            self.log_base = Some(log_base);
        }
        self
    }

    pub fn set_crossing(&mut self, value: f64) -> &mut Self {
        self.crossing = Some(value);
        self
    }

    pub fn set_crossing_max(&mut self) -> &mut Self {
        self.crossing_max = true;
        self
    }

    pub fn set_position(&mut self, position: AxisBetween) -> &mut Self {
        if !self.is_category {
            warn!("set_position(): only valid for category axes");
        }
        self.position_axis = Some(position);
        self
    }

    pub fn set_label_position(&mut self, position: AxisLabelPosition) -> &mut Self {
        self.label_position = position;
        self
    }

    pub fn set_major_tick_mark(&mut self, tick_mark: TickMark) -> &mut Self {
        self.major_tick_mark = Some(tick_mark);
        self
    }

    pub fn set_minor_tick_mark(&mut self, tick_mark: TickMark) -> &mut Self {
        self.minor_tick_mark = Some(tick_mark);
        self
    }

    pub fn set_major_gridlines(&mut self, visible: bool) -> &mut Self {
        self.major_gridlines = visible;
        self
    }

    pub fn set_minor_gridlines(&mut self, visible: bool) -> &mut Self {
        self.minor_gridlines = visible;
        self
    }

    pub fn hide(&mut self) -> &mut Self {
        self.hidden = true;
        self
    }

    pub fn title(&self) -> &ChartTitle {
        &self.title
    }
}

/// A chart and everything needed to write `xl/charts/chartN.xml`.
///
/// Build it with [`Chart::new`], add series, then move it into a worksheet
/// with `Worksheet::insert_chart`. Ranges are resolved against the
/// workbook's sheets when the workbook is closed.
#[derive(Debug, Clone)]
pub struct Chart {
    chart_type: ChartType,
    pub(crate) series: Vec<ChartSeries>,
    pub(crate) title: ChartTitle,
    pub(crate) x_axis: ChartAxis,
    pub(crate) y_axis: ChartAxis,
    style_id: u8,
    hole_size: u8,
    rotation: u16,
    legend_position: LegendPosition,
    show_blanks_as: BlanksAs,
    show_hidden_data: bool,
    grouping: Grouping,
    default_cross_between: AxisBetween,
    default_marker: Option<MarkerType>,
    has_horiz_cat_axis: bool,
    has_horiz_val_axis: bool,
    gap: u16,
    overlap: i8,
}

impl Chart {
    pub fn new(chart_type: ChartType) -> Self {
        let mut chart = Self {
            chart_type,
            series: Vec::new(),
            title: ChartTitle::default(),
            x_axis: ChartAxis::new(AxisPosition::Bottom, false),
            y_axis: ChartAxis::new(AxisPosition::Left, true),
            style_id: DEFAULT_STYLE_ID,
            hole_size: DEFAULT_HOLE_SIZE,
            rotation: 0,
            legend_position: LegendPosition::Right,
            show_blanks_as: BlanksAs::Gap,
            show_hidden_data: false,
            grouping: Grouping::Clustered,
            default_cross_between: AxisBetween::Between,
            default_marker: None,
            has_horiz_cat_axis: false,
            has_horiz_val_axis: true,
            gap: DEFAULT_GAP,
            overlap: 0,
        };
        chart.initialize();
        chart
    }

    fn initialize(&mut self) {
        use ChartType::*;
        let chart_type = self.chart_type;

        match chart_type.group() {
            ChartGroup::Area => {
                self.grouping = Grouping::Standard;
                self.default_cross_between = AxisBetween::OnTick;
                self.x_axis.is_category = true;
                if chart_type == AreaStacked {
                    self.grouping = Grouping::Stacked;
                }
                if chart_type == AreaStackedPercent {
                    self.grouping = Grouping::PercentStacked;
                    self.y_axis.default_num_format = "0%".to_string();
                }
            }
            // Bar axes are swapped when written: x holds the value axis.
            ChartGroup::Bar => {
                self.x_axis.major_gridlines = true;
                self.y_axis.major_gridlines = false;
                self.y_axis.is_category = true;
                self.x_axis.is_value = true;
                self.has_horiz_cat_axis = true;
                self.has_horiz_val_axis = false;
                if chart_type == BarStacked {
                    self.grouping = Grouping::Stacked;
                    self.overlap = 100;
                }
                if chart_type == BarStackedPercent {
                    self.grouping = Grouping::PercentStacked;
                    self.x_axis.default_num_format = "0%".to_string();
                    self.overlap = 100;
                }
            }
            ChartGroup::Column => {
                self.has_horiz_val_axis = false;
                self.x_axis.is_category = true;
                self.y_axis.is_value = true;
                if chart_type == ColumnStacked {
                    self.grouping = Grouping::Stacked;
                    self.overlap = 100;
                }
                if chart_type == ColumnStackedPercent {
                    self.grouping = Grouping::PercentStacked;
                    self.y_axis.default_num_format = "0%".to_string();
                    self.overlap = 100;
                }
            }
            ChartGroup::Doughnut | ChartGroup::Pie => {}
            ChartGroup::Line => {
                self.default_marker = Some(MarkerType::None);
                self.grouping = Grouping::Standard;
                self.x_axis.is_category = true;
                self.y_axis.is_value = true;
            }
            ChartGroup::Scatter => {
                self.has_horiz_val_axis = false;
                self.default_cross_between = AxisBetween::OnTick;
                self.x_axis.is_value = true;
                self.y_axis.is_value = true;
                if matches!(chart_type, ScatterStraight | ScatterSmooth) {
                    self.default_marker = Some(MarkerType::None);
                }
            }
            ChartGroup::Radar => {
                if chart_type == Radar {
                    self.default_marker = Some(MarkerType::None);
                }
                self.x_axis.major_gridlines = true;
                self.x_axis.is_category = true;
                self.y_axis.is_value = true;
                self.y_axis.major_tick_mark = Some(TickMark::Crossing);
            }
        }
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// Add a series. Either argument may be a formula such as
    /// `=Sheet1!$A$1:$A$5`; the leading `=` is optional. Scatter charts need
    /// both.
    pub fn add_series(
        &mut self,
        categories: Option<&str>,
        values: Option<&str>,
    ) -> Result<&mut ChartSeries> {
        if self.chart_type.group() == ChartGroup::Scatter && values.is_some() && categories.is_none()
        {
            warn!("add_series(): scatter charts must have 'categories' and 'values'");
            return Err(XlsxError::ParameterValidation);
        }

        let smooth = matches!(
            self.chart_type,
            ChartType::ScatterSmooth | ChartType::ScatterSmoothWithMarkers
        );

        self.series.push(ChartSeries {
            categories: categories.map(ChartRange::from_formula).unwrap_or_default(),
            values: values.map(ChartRange::from_formula).unwrap_or_default(),
            title: ChartTitle::default(),
            smooth,
            marker: None,
            line: None,
        });

        let index = self.series.len() - 1;
        Ok(&mut self.series[index])
    }

    pub fn series(&self) -> &[ChartSeries] {
        &self.series
    }

    pub fn series_mut(&mut self, index: usize) -> Option<&mut ChartSeries> {
        self.series.get_mut(index)
    }

    pub fn x_axis(&mut self) -> &mut ChartAxis {
        &mut self.x_axis
    }

    pub fn y_axis(&mut self) -> &mut ChartAxis {
        &mut self.y_axis
    }

    pub fn title_set_name(&mut self, name: &str) -> &mut Self {
        self.title.set_name(name);
        self
    }

    pub fn title_set_name_range(&mut self, sheetname: &str, row: u32, col: u16) -> &mut Self {
        self.title.set_name_range(sheetname, row, col);
        self
    }

    pub fn title_off(&mut self) -> &mut Self {
        self.title.off = true;
        self
    }

    /// Styles outside 1..=48 fall back to the default, 2.
    pub fn set_style(&mut self, style_id: u8) -> &mut Self {
        self.style_id = if (1..=48).contains(&style_id) { style_id } else { DEFAULT_STYLE_ID };
        self
    }

    pub fn legend_set_position(&mut self, position: LegendPosition) -> &mut Self {
        self.legend_position = position;
        self
    }

    pub fn set_hole_size(&mut self, size: u8) -> &mut Self {
        if (10..=90).contains(&size) {
            self.hole_size = size;
        } else {
            warn!(
                "set_hole_size(): Hole size '{}' outside Excel range: 10 <= size <= 90",
                size
            );
        }
        self
    }

    pub fn set_rotation(&mut self, rotation: u16) -> &mut Self {
        if rotation <= 360 {
            self.rotation = rotation;
        } else {
            warn!(
                "set_rotation(): Chart rotation '{}' outside Excel range: 0 <= rotation <= 360",
                rotation
            );
        }
        self
    }

    pub fn show_blanks_as(&mut self, option: BlanksAs) -> &mut Self {
        self.show_blanks_as = option;
        self
    }

    pub fn show_hidden_data(&mut self) -> &mut Self {
        self.show_hidden_data = true;
        self
    }

    /// Gap between bar/column clusters, 0..=500 percent.
    pub fn set_series_gap(&mut self, gap: u16) -> &mut Self {
        if gap <= 500 {
            self.gap = gap;
        } else {
            warn!("set_series_gap(): Chart series gap '{}' outside Excel range: 0 <= gap <= 500", gap);
        }
        self
    }

    pub fn set_series_overlap(&mut self, overlap: i8) -> &mut Self {
        if (-100..=100).contains(&overlap) {
            self.overlap = overlap;
        } else {
            warn!(
                "set_series_overlap(): Chart series overlap '{}' outside Excel range: -100 <= overlap <= 100",
                overlap
            );
        }
        self
    }

    /// A chart needs at least one series and every series needs values.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.series.is_empty() {
            warn!("insert_chart(): chart must contain at least one series");
            return Err(XlsxError::ParameterValidation);
        }
        if self.series.iter().any(|series| series.values.formula.is_none()) {
            warn!("insert_chart(): chart series must have a 'values' range");
            return Err(XlsxError::ParameterValidation);
        }
        Ok(())
    }

    /// Every range the cache pass visits: chart title, axis titles, then each
    /// series.
    pub(crate) fn ranges_mut(&mut self) -> Vec<&mut ChartRange> {
        let mut ranges = vec![
            &mut self.title.range,
            &mut self.x_axis.title.range,
            &mut self.y_axis.title.range,
        ];
        for series in &mut self.series {
            ranges.extend(series.ranges_mut());
        }
        ranges
    }

    pub fn assemble_xml_file(&self) -> Vec<u8> {
        let mut writer = ChartWriter::new(self);
        writer.write_chart_space();
        writer.xml.into_bytes()
    }
}

/// Per-write state. The series counter and `cat_has_num_fmt` are only
/// meaningful while one chart is being serialized.
struct ChartWriter<'a> {
    chart: &'a Chart,
    xml: XmlWriter,
    x_axis: &'a ChartAxis,
    y_axis: &'a ChartAxis,
    axis_id_1: u32,
    axis_id_2: u32,
    series_index: u32,
    cat_has_num_fmt: bool,
}

impl<'a> ChartWriter<'a> {
    fn new(chart: &'a Chart) -> Self {
        let (x_axis, y_axis) = if chart.chart_type.group() == ChartGroup::Bar {
            (&chart.y_axis, &chart.x_axis)
        } else {
            (&chart.x_axis, &chart.y_axis)
        };
        Self {
            chart,
            xml: XmlWriter::with_capacity(4096),
            x_axis,
            y_axis,
            axis_id_1: AXIS_ID_BASE + 1,
            axis_id_2: AXIS_ID_BASE + 2,
            series_index: 0,
            cat_has_num_fmt: false,
        }
    }

    fn write_chart_space(&mut self) {
        self.xml.declaration();
        self.xml.start_tag(
            "c:chartSpace",
            &[
                Attr::str("xmlns:c", format!("{}/chart", SCHEMA_DRAWING)),
                Attr::str("xmlns:a", format!("{}/main", SCHEMA_DRAWING)),
                Attr::str("xmlns:r", SCHEMA_OFFICEDOC_RELS),
            ],
        );
        self.xml.empty_tag("c:lang", &[Attr::str("val", "en-US")]);
        if self.chart.style_id != DEFAULT_STYLE_ID {
            self.xml.empty_tag("c:style", &[Attr::int("val", self.chart.style_id)]);
        }
        self.write_chart();
        self.write_print_settings();
        self.xml.end_tag("c:chartSpace");
    }

    fn write_chart(&mut self) {
        self.xml.start_tag("c:chart", &[]);

        let chart = self.chart;
        if chart.title.off {
            self.xml.empty_tag("c:autoTitleDeleted", &[Attr::str("val", "1")]);
        } else {
            self.write_title(&chart.title, false);
        }

        match self.chart.chart_type.group() {
            ChartGroup::Pie | ChartGroup::Doughnut => self.write_pie_plot_area(),
            ChartGroup::Scatter => self.write_scatter_plot_area(),
            _ => self.write_plot_area(),
        }

        self.write_legend();

        if !self.chart.show_hidden_data {
            self.xml.empty_tag("c:plotVisOnly", &[Attr::str("val", "1")]);
        }

        match self.chart.show_blanks_as {
            BlanksAs::Zero => self.xml.empty_tag("c:dispBlanksAs", &[Attr::str("val", "zero")]),
            BlanksAs::Connected => self.xml.empty_tag("c:dispBlanksAs", &[Attr::str("val", "span")]),
            BlanksAs::Gap => {}
        }

        self.xml.end_tag("c:chart");
    }

    fn write_print_settings(&mut self) {
        self.xml.start_tag("c:printSettings", &[]);
        self.xml.empty_tag("c:headerFooter", &[]);
        self.xml.empty_tag(
            "c:pageMargins",
            &[
                Attr::str("b", "0.75"),
                Attr::str("l", "0.7"),
                Attr::str("r", "0.7"),
                Attr::str("t", "0.75"),
                Attr::str("header", "0.3"),
                Attr::str("footer", "0.3"),
            ],
        );
        self.xml.empty_tag("c:pageSetup", &[]);
        self.xml.end_tag("c:printSettings");
    }

    // Plot areas.

    fn write_plot_area(&mut self) {
        self.xml.start_tag("c:plotArea", &[]);
        self.xml.empty_tag("c:layout", &[]);
        self.write_chart_type();
        self.write_cat_axis();
        self.write_val_axis(self.has_horiz_val_axis());
        self.xml.end_tag("c:plotArea");
    }

    fn write_scatter_plot_area(&mut self) {
        self.xml.start_tag("c:plotArea", &[]);
        self.xml.empty_tag("c:layout", &[]);
        self.write_chart_type();
        self.write_cat_val_axis();
        self.write_val_axis(true);
        self.xml.end_tag("c:plotArea");
    }

    fn write_pie_plot_area(&mut self) {
        self.xml.start_tag("c:plotArea", &[]);
        self.xml.empty_tag("c:layout", &[]);
        self.write_chart_type();
        self.xml.end_tag("c:plotArea");
    }

    fn has_horiz_val_axis(&self) -> bool {
        self.chart.has_horiz_val_axis
    }

    fn write_chart_type(&mut self) {
        match self.chart.chart_type.group() {
            ChartGroup::Area => self.write_area_chart(),
            ChartGroup::Bar => self.write_bar_chart("bar"),
            ChartGroup::Column => self.write_bar_chart("col"),
            ChartGroup::Doughnut => self.write_doughnut_chart(),
            ChartGroup::Line => self.write_line_chart(),
            ChartGroup::Pie => self.write_pie_chart(),
            ChartGroup::Scatter => self.write_scatter_chart(),
            ChartGroup::Radar => self.write_radar_chart(),
        }
    }

    // Chart type elements.

    fn write_area_chart(&mut self) {
        self.xml.start_tag("c:areaChart", &[]);
        self.write_grouping();
        self.write_all_series();
        self.write_axis_ids();
        self.xml.end_tag("c:areaChart");
    }

    fn write_bar_chart(&mut self, bar_dir: &str) {
        self.xml.start_tag("c:barChart", &[]);
        self.xml.empty_tag("c:barDir", &[Attr::str("val", bar_dir)]);
        self.write_grouping();
        self.write_all_series();
        if self.chart.gap != DEFAULT_GAP {
            self.xml.empty_tag("c:gapWidth", &[Attr::int("val", self.chart.gap)]);
        }
        if self.chart.overlap != 0 {
            self.xml.empty_tag("c:overlap", &[Attr::int("val", self.chart.overlap)]);
        }
        self.write_axis_ids();
        self.xml.end_tag("c:barChart");
    }

    fn write_doughnut_chart(&mut self) {
        self.xml.start_tag("c:doughnutChart", &[]);
        self.xml.empty_tag("c:varyColors", &[Attr::str("val", "1")]);
        self.write_all_series();
        self.xml.empty_tag("c:firstSliceAng", &[Attr::int("val", self.chart.rotation)]);
        self.xml.empty_tag("c:holeSize", &[Attr::int("val", self.chart.hole_size)]);
        self.xml.end_tag("c:doughnutChart");
    }

    fn write_line_chart(&mut self) {
        self.xml.start_tag("c:lineChart", &[]);
        self.write_grouping();
        self.write_all_series();
        self.xml.empty_tag("c:marker", &[Attr::str("val", "1")]);
        self.write_axis_ids();
        self.xml.end_tag("c:lineChart");
    }

    fn write_pie_chart(&mut self) {
        self.xml.start_tag("c:pieChart", &[]);
        self.xml.empty_tag("c:varyColors", &[Attr::str("val", "1")]);
        self.write_all_series();
        self.xml.empty_tag("c:firstSliceAng", &[Attr::int("val", self.chart.rotation)]);
        self.xml.end_tag("c:pieChart");
    }

    fn write_scatter_chart(&mut self) {
        let style = match self.chart.chart_type {
            ChartType::ScatterSmooth | ChartType::ScatterSmoothWithMarkers => "smoothMarker",
            _ => "lineMarker",
        };
        self.xml.start_tag("c:scatterChart", &[]);
        self.xml.empty_tag("c:scatterStyle", &[Attr::str("val", style)]);
        let chart = self.chart;
        for series in &chart.series {
            self.write_xval_ser(series);
        }
        self.write_axis_ids();
        self.xml.end_tag("c:scatterChart");
    }

    fn write_radar_chart(&mut self) {
        let style = if self.chart.chart_type == ChartType::RadarFilled { "filled" } else { "marker" };
        self.xml.start_tag("c:radarChart", &[]);
        self.xml.empty_tag("c:radarStyle", &[Attr::str("val", style)]);
        self.write_all_series();
        self.write_axis_ids();
        self.xml.end_tag("c:radarChart");
    }

    fn write_grouping(&mut self) {
        self.xml.empty_tag("c:grouping", &[Attr::str("val", self.chart.grouping.xml_val())]);
    }

    fn write_axis_ids(&mut self) {
        self.xml.empty_tag("c:axId", &[Attr::int("val", self.axis_id_1)]);
        self.xml.empty_tag("c:axId", &[Attr::int("val", self.axis_id_2)]);
    }

    // Series.

    fn write_all_series(&mut self) {
        let chart = self.chart;
        for series in &chart.series {
            self.write_ser(series);
        }
    }

    fn write_ser_header(&mut self, series: &ChartSeries) {
        let index = self.series_index;
        self.series_index += 1;

        self.xml.empty_tag("c:idx", &[Attr::int("val", index)]);
        self.xml.empty_tag("c:order", &[Attr::int("val", index)]);

        if let Some(name) = &series.title.name {
            self.xml.start_tag("c:tx", &[]);
            self.xml.data_element("c:v", name, &[]);
            self.xml.end_tag("c:tx");
        } else if series.title.range.formula.is_some() {
            self.xml.start_tag("c:tx", &[]);
            self.write_str_ref(&series.title.range);
            self.xml.end_tag("c:tx");
        }
    }

    fn write_ser(&mut self, series: &ChartSeries) {
        self.xml.start_tag("c:ser", &[]);
        self.write_ser_header(series);
        self.write_sp_pr(series.line.as_ref());
        self.write_marker(series.marker.as_ref());

        if series.categories.formula.is_some() {
            self.cat_has_num_fmt = !series.categories.has_string_cache;
            self.xml.start_tag("c:cat", &[]);
            self.write_data_cache(&series.categories, series.categories.has_string_cache);
            self.xml.end_tag("c:cat");
        }

        self.xml.start_tag("c:val", &[]);
        self.write_data_cache(&series.values, false);
        self.xml.end_tag("c:val");

        if self.chart.chart_type.group() == ChartGroup::Line && series.smooth {
            self.xml.empty_tag("c:smooth", &[Attr::str("val", "1")]);
        }
        self.xml.end_tag("c:ser");
    }

    fn write_xval_ser(&mut self, series: &ChartSeries) {
        self.xml.start_tag("c:ser", &[]);
        self.write_ser_header(series);

        // Plain scatter charts hide the connecting line unless one was set.
        let default_line = ChartLine { none: true, ..ChartLine::default() };
        let line = match (series.line.as_ref(), self.chart.chart_type) {
            (None, ChartType::Scatter) => Some(&default_line),
            (line, _) => line,
        };
        self.write_sp_pr(line);
        self.write_marker(series.marker.as_ref());

        self.xml.start_tag("c:xVal", &[]);
        self.write_data_cache(&series.categories, series.categories.has_string_cache);
        self.xml.end_tag("c:xVal");

        self.xml.start_tag("c:yVal", &[]);
        self.write_data_cache(&series.values, false);
        self.xml.end_tag("c:yVal");

        if series.smooth {
            self.xml.empty_tag("c:smooth", &[Attr::str("val", "1")]);
        }
        self.xml.end_tag("c:ser");
    }

    fn write_sp_pr(&mut self, line: Option<&ChartLine>) {
        let Some(line) = line else {
            return;
        };

        // Widths snap to quarter points before conversion to EMUs.
        let width = ((line.width + 0.125) * 4.0).trunc() / 4.0;
        let width_emu = (0.5 + 12700.0 * width) as u32;

        self.xml.start_tag("c:spPr", &[]);
        if width_emu > 0 {
            self.xml.start_tag("a:ln", &[Attr::int("w", width_emu)]);
        } else {
            self.xml.start_tag("a:ln", &[]);
        }
        if line.none {
            self.xml.empty_tag("a:noFill", &[]);
        } else if let Some(color) = line.color {
            self.xml.start_tag("a:solidFill", &[]);
            self.xml.empty_tag("a:srgbClr", &[Attr::str("val", format!("{:06X}", color & 0xFF_FFFF))]);
            self.xml.end_tag("a:solidFill");
        }
        self.xml.end_tag("a:ln");
        self.xml.end_tag("c:spPr");
    }

    fn write_marker(&mut self, marker: Option<&ChartMarker>) {
        let (marker_type, size) = match marker {
            Some(ChartMarker { marker_type: Some(marker_type), size }) => (*marker_type, *size),
            _ => match self.chart.default_marker {
                Some(marker_type) => (marker_type, 0),
                None => return,
            },
        };

        if marker_type == MarkerType::Automatic {
            return;
        }

        self.xml.start_tag("c:marker", &[]);
        self.xml.empty_tag("c:symbol", &[Attr::str("val", marker_type.xml_val())]);
        if size > 0 {
            self.xml.empty_tag("c:size", &[Attr::int("val", size)]);
        }
        self.xml.end_tag("c:marker");
    }

    // Data references and caches.

    fn write_data_cache(&mut self, range: &ChartRange, has_string_cache: bool) {
        if has_string_cache {
            self.write_str_ref(range);
        } else {
            self.write_num_ref(range);
        }
    }

    fn write_num_ref(&mut self, range: &ChartRange) {
        self.xml.start_tag("c:numRef", &[]);
        self.xml.data_element("c:f", range.formula.as_deref().unwrap_or_default(), &[]);
        if !range.data_cache.is_empty() {
            self.xml.start_tag("c:numCache", &[]);
            self.xml.data_element("c:formatCode", "General", &[]);
            self.xml.empty_tag("c:ptCount", &[Attr::int("val", range.data_cache.len() as u32)]);
            for (index, point) in range.data_cache.iter().enumerate() {
                let number = match point {
                    DataPoint::NoData => continue,
                    DataPoint::Number(number) => *number,
                    DataPoint::String(_) => 0.0,
                };
                self.xml.start_tag("c:pt", &[Attr::int("idx", index as u32)]);
                self.xml.data_element("c:v", &format_f64(number), &[]);
                self.xml.end_tag("c:pt");
            }
            self.xml.end_tag("c:numCache");
        }
        self.xml.end_tag("c:numRef");
    }

    fn write_str_ref(&mut self, range: &ChartRange) {
        self.xml.start_tag("c:strRef", &[]);
        self.xml.data_element("c:f", range.formula.as_deref().unwrap_or_default(), &[]);
        if !range.data_cache.is_empty() {
            self.xml.start_tag("c:strCache", &[]);
            self.xml.empty_tag("c:ptCount", &[Attr::int("val", range.data_cache.len() as u32)]);
            for (index, point) in range.data_cache.iter().enumerate() {
                let value = match point {
                    DataPoint::NoData => continue,
                    DataPoint::Number(number) => format_f64(*number),
                    DataPoint::String(s) => s.clone(),
                };
                self.xml.start_tag("c:pt", &[Attr::int("idx", index as u32)]);
                self.xml.data_element("c:v", &value, &[]);
                self.xml.end_tag("c:pt");
            }
            self.xml.end_tag("c:strCache");
        }
        self.xml.end_tag("c:strRef");
    }

    // Titles.

    fn write_title(&mut self, title: &ChartTitle, is_horizontal: bool) {
        if let Some(name) = &title.name {
            self.xml.start_tag("c:title", &[]);
            self.xml.start_tag("c:tx", &[]);
            self.xml.start_tag("c:rich", &[]);
            self.write_body_pr(is_horizontal);
            self.xml.empty_tag("a:lstStyle", &[]);
            self.xml.start_tag("a:p", &[]);
            self.write_p_pr(false);
            self.xml.start_tag("a:r", &[]);
            self.xml.empty_tag("a:rPr", &[Attr::str("lang", "en-US")]);
            self.xml.data_element("a:t", name, &[]);
            self.xml.end_tag("a:r");
            self.xml.end_tag("a:p");
            self.xml.end_tag("c:rich");
            self.xml.end_tag("c:tx");
            self.xml.empty_tag("c:layout", &[]);
            self.xml.end_tag("c:title");
        } else if title.range.formula.is_some() {
            self.xml.start_tag("c:title", &[]);
            self.xml.start_tag("c:tx", &[]);
            self.write_str_ref(&title.range);
            self.xml.end_tag("c:tx");
            self.xml.empty_tag("c:layout", &[]);
            self.write_tx_pr(is_horizontal, false);
            self.xml.end_tag("c:title");
        }
    }

    fn write_body_pr(&mut self, is_horizontal: bool) {
        if is_horizontal {
            self.xml.empty_tag(
                "a:bodyPr",
                &[Attr::int("rot", -5_400_000), Attr::str("vert", "horz")],
            );
        } else {
            self.xml.empty_tag("a:bodyPr", &[]);
        }
    }

    fn write_p_pr(&mut self, rtl: bool) {
        if rtl {
            self.xml.start_tag("a:pPr", &[Attr::str("rtl", "0")]);
        } else {
            self.xml.start_tag("a:pPr", &[]);
        }
        self.xml.empty_tag("a:defRPr", &[]);
        self.xml.end_tag("a:pPr");
    }

    fn write_tx_pr(&mut self, is_horizontal: bool, pie: bool) {
        self.xml.start_tag("c:txPr", &[]);
        self.write_body_pr(is_horizontal);
        self.xml.empty_tag("a:lstStyle", &[]);
        self.xml.start_tag("a:p", &[]);
        self.write_p_pr(pie);
        self.xml.empty_tag("a:endParaRPr", &[Attr::str("lang", "en-US")]);
        self.xml.end_tag("a:p");
        self.xml.end_tag("c:txPr");
    }

    // Axes.

    /// Axis sides after accounting for the other axis crossing at its max.
    fn axis_positions(&self) -> (AxisPosition, AxisPosition) {
        let mut x_position = self.x_axis.axis_position;
        let mut y_position = self.y_axis.axis_position;
        if self.x_axis.crossing_max {
            y_position = y_position.flipped();
        }
        if self.y_axis.crossing_max {
            x_position = x_position.flipped();
        }
        (x_position, y_position)
    }

    fn write_scaling(&mut self, axis: &ChartAxis, with_limits: bool) {
        self.xml.start_tag("c:scaling", &[]);
        if with_limits {
            if let Some(log_base) = axis.log_base {
                self.xml.empty_tag("c:logBase", &[Attr::int("val", log_base)]);
            }
        }
        let orientation = if axis.reverse { "maxMin" } else { "minMax" };
        self.xml.empty_tag("c:orientation", &[Attr::str("val", orientation)]);
        if with_limits {
            if let Some(max) = axis.max {
                self.xml.empty_tag("c:max", &[Attr::num("val", max)]);
            }
            if let Some(min) = axis.min {
                self.xml.empty_tag("c:min", &[Attr::num("val", min)]);
            }
        }
        self.xml.end_tag("c:scaling");
    }

    fn write_axis_pos(&mut self, position: AxisPosition, other_reversed: bool) {
        let position = if other_reversed { position.flipped() } else { position };
        self.xml.empty_tag("c:axPos", &[Attr::str("val", position.xml_val())]);
    }

    fn write_gridlines(&mut self, axis: &ChartAxis) {
        if axis.major_gridlines {
            self.xml.empty_tag("c:majorGridlines", &[]);
        }
        if axis.minor_gridlines {
            self.xml.empty_tag("c:minorGridlines", &[]);
        }
    }

    fn write_tick_marks(&mut self, axis: &ChartAxis) {
        if let Some(tick) = axis.major_tick_mark {
            self.xml.empty_tag("c:majorTickMark", &[Attr::str("val", tick.xml_val())]);
        }
        if let Some(tick) = axis.minor_tick_mark {
            self.xml.empty_tag("c:minorTickMark", &[Attr::str("val", tick.xml_val())]);
        }
    }

    fn write_tick_label_pos(&mut self, axis: &ChartAxis) {
        let val = match axis.label_position {
            AxisLabelPosition::High => "high",
            AxisLabelPosition::Low => "low",
            AxisLabelPosition::None => "none",
            AxisLabelPosition::NextTo => "nextTo",
        };
        self.xml.empty_tag("c:tickLblPos", &[Attr::str("val", val)]);
    }

    /// `(format, source_linked, is_default)`.
    fn number_format(axis: &ChartAxis) -> (&str, bool, bool) {
        let format = axis.num_format.as_deref().unwrap_or(&axis.default_num_format);
        let is_default = format == axis.default_num_format;
        (format, is_default, is_default)
    }

    fn write_number_format(&mut self, axis: &ChartAxis) {
        let (format, source_linked, _) = Self::number_format(axis);
        self.xml.empty_tag(
            "c:numFmt",
            &[Attr::str("formatCode", format), Attr::int("sourceLinked", source_linked as u8)],
        );
    }

    fn write_cat_number_format(&mut self, axis: &ChartAxis) {
        let (format, source_linked, is_default) = Self::number_format(axis);
        if !self.cat_has_num_fmt && is_default {
            return;
        }
        self.xml.empty_tag(
            "c:numFmt",
            &[Attr::str("formatCode", format), Attr::int("sourceLinked", source_linked as u8)],
        );
    }

    fn write_crosses(&mut self, other: &ChartAxis) {
        match other.crossing {
            Some(value) if !other.crossing_max => {
                self.xml.empty_tag("c:crossesAt", &[Attr::num("val", value)]);
            }
            _ => {
                let val = if other.crossing_max { "max" } else { "autoZero" };
                self.xml.empty_tag("c:crosses", &[Attr::str("val", val)]);
            }
        }
    }

    fn write_cross_between(&mut self, position: Option<AxisBetween>) {
        let val = match position.unwrap_or(self.chart.default_cross_between) {
            AxisBetween::OnTick => "midCat",
            AxisBetween::Between => "between",
        };
        self.xml.empty_tag("c:crossBetween", &[Attr::str("val", val)]);
    }

    fn write_cat_axis(&mut self) {
        let (x_axis, y_axis) = (self.x_axis, self.y_axis);
        let (x_position, _) = self.axis_positions();

        self.xml.start_tag("c:catAx", &[]);
        self.xml.empty_tag("c:axId", &[Attr::int("val", self.axis_id_1)]);
        self.write_scaling(x_axis, false);
        if x_axis.hidden {
            self.xml.empty_tag("c:delete", &[Attr::str("val", "1")]);
        }
        self.write_axis_pos(x_position, y_axis.reverse);
        self.write_gridlines(x_axis);
        self.write_title(&x_axis.title, self.chart.has_horiz_cat_axis);
        self.write_cat_number_format(x_axis);
        self.write_tick_marks(x_axis);
        self.write_tick_label_pos(x_axis);
        self.xml.empty_tag("c:crossAx", &[Attr::int("val", self.axis_id_2)]);
        self.write_crosses(y_axis);
        self.xml.empty_tag("c:auto", &[Attr::str("val", "1")]);
        self.xml.empty_tag("c:lblAlgn", &[Attr::str("val", "ctr")]);
        self.xml.empty_tag("c:lblOffset", &[Attr::str("val", "100")]);
        self.xml.end_tag("c:catAx");
    }

    fn write_val_axis(&mut self, title_horizontal: bool) {
        let (x_axis, y_axis) = (self.x_axis, self.y_axis);
        let (_, y_position) = self.axis_positions();

        self.xml.start_tag("c:valAx", &[]);
        self.xml.empty_tag("c:axId", &[Attr::int("val", self.axis_id_2)]);
        self.write_scaling(y_axis, true);
        if y_axis.hidden {
            self.xml.empty_tag("c:delete", &[Attr::str("val", "1")]);
        }
        self.write_axis_pos(y_position, x_axis.reverse);
        self.write_gridlines(y_axis);
        self.write_title(&y_axis.title, title_horizontal);
        self.write_number_format(y_axis);
        self.write_tick_marks(y_axis);
        self.write_tick_label_pos(y_axis);
        self.xml.empty_tag("c:crossAx", &[Attr::int("val", self.axis_id_1)]);
        self.write_crosses(x_axis);
        self.write_cross_between(x_axis.position_axis);
        self.xml.end_tag("c:valAx");
    }

    /// Scatter x axis: a value axis in the category slot.
    fn write_cat_val_axis(&mut self) {
        let (x_axis, y_axis) = (self.x_axis, self.y_axis);
        let (x_position, _) = self.axis_positions();

        self.xml.start_tag("c:valAx", &[]);
        self.xml.empty_tag("c:axId", &[Attr::int("val", self.axis_id_1)]);
        self.write_scaling(x_axis, true);
        if x_axis.hidden {
            self.xml.empty_tag("c:delete", &[Attr::str("val", "1")]);
        }
        self.write_axis_pos(x_position, y_axis.reverse);
        self.write_gridlines(x_axis);
        self.write_title(&x_axis.title, self.chart.has_horiz_val_axis);
        self.write_number_format(x_axis);
        self.write_tick_marks(x_axis);
        self.write_tick_label_pos(x_axis);
        self.xml.empty_tag("c:crossAx", &[Attr::int("val", self.axis_id_2)]);
        self.write_crosses(y_axis);
        self.write_cross_between(y_axis.position_axis);
        self.xml.end_tag("c:valAx");
    }

    // Legend.

    fn write_legend(&mut self) {
        let (position, overlay) = match self.chart.legend_position {
            LegendPosition::None => return,
            LegendPosition::Right => ("r", false),
            LegendPosition::Left => ("l", false),
            LegendPosition::Top => ("t", false),
            LegendPosition::Bottom => ("b", false),
            LegendPosition::OverlayRight => ("r", true),
            LegendPosition::OverlayLeft => ("l", true),
        };

        self.xml.start_tag("c:legend", &[]);
        self.xml.empty_tag("c:legendPos", &[Attr::str("val", position)]);
        self.xml.empty_tag("c:layout", &[]);

        let is_pie = matches!(self.chart.chart_type.group(), ChartGroup::Pie | ChartGroup::Doughnut);
        if overlay {
            self.xml.empty_tag("c:overlay", &[Attr::str("val", "1")]);
        }
        if is_pie {
            self.write_tx_pr(false, true);
        }
        self.xml.end_tag("c:legend");
    }
}

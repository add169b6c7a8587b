//! Write Excel `.xlsx` workbooks.
//!
//! A [`Workbook`] owns its worksheets, the format table and the shared
//! string table. Cells are written through [`Worksheet`], formats are
//! registered once with [`Workbook::add_format`] and referenced by
//! [`FormatId`], and [`Workbook::close`] serializes every OOXML part into a
//! ZIP container.

mod chart;
mod content_types;
mod doc_props;
mod drawing;
mod error;
mod format;
mod image;
mod packager;
mod relationships;
mod shared_strings;
mod styles;
mod theme;
mod types;
pub mod utility;
mod validation;
mod workbook;
mod worksheet;
mod xml;

pub use chart::{
    AxisBetween, AxisLabelPosition, AxisPosition, BlanksAs, Chart, ChartAxis, ChartLine,
    ChartMarker, ChartRange, ChartSeries, ChartTitle, ChartType, DataPoint, LegendPosition,
    MarkerType, RangeState, TickMark,
};
pub use doc_props::{CustomPropertyValue, DocProperties};
pub use error::{strerror, Result, XlsxError};
pub use format::*;
pub use image::ImageType;
pub use styles::FormatId;
pub use types::{
    Gridlines, HeaderFooterOptions, ImageOptions, ProtectionOptions, RowColOptions,
    DEFAULT_COL_WIDTH, DEFAULT_ROW_HEIGHT,
};
pub use utility::{DateTime, COL_MAX, ROW_MAX};
pub use validation::{DataValidation, ValidationCriteria, ValidationErrorType, ValidationType};
pub use workbook::{Workbook, WorkbookOptions};
pub use worksheet::Worksheet;

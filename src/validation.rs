use std::fs;
use std::io::Write;
use std::path::Path;

use log::warn;

use crate::error::{Result, XlsxError};
use crate::utility::{datetime_to_excel_date, strip_formula, utf8_strlen, DateTime};
use crate::xml::{format_f64, Attr, XmlWriter};

const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
const MAX_TITLE_LEN: usize = 32;
const MAX_STRING_LEN: usize = 255;

/// Check a worksheet name against Excel's rules. Uniqueness is the
/// workbook's job.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let length = utf8_strlen(name);
    if length == 0 || length > MAX_SHEET_NAME_LEN {
        return Err(XlsxError::SheetnameLengthExceeded);
    }

    if name.contains(INVALID_SHEET_CHARS) {
        return Err(XlsxError::InvalidSheetnameCharacter);
    }

    Ok(())
}

/// Write `path` through a sibling temp file and rename it into place, so a
/// failed close never leaves a truncated workbook behind.
pub fn write_file_atomic<F>(path: &Path, write_fn: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> Result<()>,
{
    let file_name = path
        .file_name()
        .ok_or_else(|| XlsxError::CreatingXlsxFile(std::io::ErrorKind::InvalidInput.into()))?;

    let mut temp_name = file_name.to_os_string();
    temp_name.push(format!(".tmp.{}", std::process::id()));
    let temp_path = path.with_file_name(temp_name);

    let write_result = (|| {
        let mut temp_file = fs::File::create(&temp_path).map_err(XlsxError::CreatingXlsxFile)?;
        write_fn(&mut temp_file)?;
        temp_file.flush()?;
        temp_file.sync_all()?;
        Ok(())
    })();

    match write_result {
        Ok(()) => {
            fs::rename(&temp_path, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

/// What a data validation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationType {
    Integer,
    IntegerFormula,
    Decimal,
    DecimalFormula,
    List,
    ListFormula,
    Date,
    DateFormula,
    DateNumber,
    Time,
    TimeFormula,
    TimeNumber,
    Length,
    LengthFormula,
    CustomFormula,
    #[default]
    Any,
}

impl ValidationType {
    fn is_formula(self) -> bool {
        matches!(
            self,
            ValidationType::IntegerFormula
                | ValidationType::DecimalFormula
                | ValidationType::ListFormula
                | ValidationType::LengthFormula
                | ValidationType::DateFormula
                | ValidationType::TimeFormula
                | ValidationType::CustomFormula
        )
    }

    fn has_criteria(self) -> bool {
        !matches!(
            self,
            ValidationType::List
                | ValidationType::ListFormula
                | ValidationType::Any
                | ValidationType::CustomFormula
        )
    }

    fn xml_name(self) -> &'static str {
        match self {
            ValidationType::Integer | ValidationType::IntegerFormula => "whole",
            ValidationType::Decimal | ValidationType::DecimalFormula => "decimal",
            ValidationType::List | ValidationType::ListFormula => "list",
            ValidationType::Date | ValidationType::DateFormula | ValidationType::DateNumber => {
                "date"
            }
            ValidationType::Time | ValidationType::TimeFormula | ValidationType::TimeNumber => {
                "time"
            }
            ValidationType::Length | ValidationType::LengthFormula => "textLength",
            ValidationType::CustomFormula => "custom",
            ValidationType::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationCriteria {
    #[default]
    None,
    Between,
    NotBetween,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
}

impl ValidationCriteria {
    fn is_between(self) -> bool {
        matches!(self, ValidationCriteria::Between | ValidationCriteria::NotBetween)
    }

    fn operator(self) -> Option<&'static str> {
        match self {
            ValidationCriteria::EqualTo => Some("equal"),
            ValidationCriteria::NotEqualTo => Some("notEqual"),
            ValidationCriteria::LessThan => Some("lessThan"),
            ValidationCriteria::LessThanOrEqualTo => Some("lessThanOrEqual"),
            ValidationCriteria::GreaterThan => Some("greaterThan"),
            ValidationCriteria::GreaterThanOrEqualTo => Some("greaterThanOrEqual"),
            ValidationCriteria::NotBetween => Some("notBetween"),
            ValidationCriteria::Between | ValidationCriteria::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationErrorType {
    #[default]
    Stop,
    Warning,
    Information,
}

/// A data validation rule as supplied by the caller. Only the fields that
/// matter for `validate` and `criteria` are read.
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidation {
    pub validate: ValidationType,
    pub criteria: ValidationCriteria,
    pub ignore_blank: bool,
    pub show_input: bool,
    pub show_error: bool,
    pub error_type: ValidationErrorType,
    pub dropdown: bool,
    pub value_number: f64,
    pub value_formula: Option<String>,
    pub value_list: Vec<String>,
    pub value_datetime: DateTime,
    pub minimum_number: f64,
    pub minimum_formula: Option<String>,
    pub minimum_datetime: DateTime,
    pub maximum_number: f64,
    pub maximum_formula: Option<String>,
    pub maximum_datetime: DateTime,
    pub input_title: Option<String>,
    pub input_message: Option<String>,
    pub error_title: Option<String>,
    pub error_message: Option<String>,
}

impl Default for DataValidation {
    fn default() -> Self {
        Self {
            validate: ValidationType::Any,
            criteria: ValidationCriteria::None,
            ignore_blank: true,
            show_input: true,
            show_error: true,
            error_type: ValidationErrorType::Stop,
            dropdown: true,
            value_number: 0.0,
            value_formula: None,
            value_list: Vec::new(),
            value_datetime: DateTime::default(),
            minimum_number: 0.0,
            minimum_formula: None,
            minimum_datetime: DateTime::default(),
            maximum_number: 0.0,
            maximum_formula: None,
            maximum_datetime: DateTime::default(),
            input_title: None,
            input_message: None,
            error_title: None,
            error_message: None,
        }
    }
}

/// Normalized copy kept by the worksheet: formulas stripped, lists joined,
/// dates converted, and the target range rendered as `sqref`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredValidation {
    validate: ValidationType,
    criteria: ValidationCriteria,
    error_type: ValidationErrorType,
    ignore_blank: bool,
    dropdown: bool,
    show_input: bool,
    show_error: bool,
    value_number: f64,
    maximum_number: f64,
    value_formula: Option<String>,
    maximum_formula: Option<String>,
    input_title: Option<String>,
    input_message: Option<String>,
    error_title: Option<String>,
    error_message: Option<String>,
    sqref: String,
}

fn check_length(value: &Option<String>, limit: usize, label: &str) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if utf8_strlen(value) <= limit {
        return Ok(());
    }
    warn!("data_validation_cell()/_range(): {} length > Excel limit of {}.", label, limit);
    Err(if limit == MAX_TITLE_LEN {
        XlsxError::String32LengthExceeded
    } else {
        XlsxError::String255LengthExceeded
    })
}

/// Joined length of a list validation, commas included.
fn list_length(list: &[String]) -> usize {
    if list.is_empty() {
        return 0;
    }
    list.iter().map(|s| utf8_strlen(s)).sum::<usize>() + list.len() - 1
}

impl DataValidation {
    /// Parameter checks shared by the cell and range entry points. `Ok(false)`
    /// means there is nothing to store.
    pub(crate) fn check(&self) -> Result<bool> {
        if self.validate == ValidationType::Any
            && self.input_title.is_none()
            && self.input_message.is_none()
        {
            return Ok(false);
        }

        let has_criteria = self.validate.has_criteria();
        if has_criteria && self.criteria == ValidationCriteria::None {
            warn!("data_validation_cell()/_range(): criteria parameter must be specified.");
            return Err(XlsxError::ParameterValidation);
        }

        let is_between = has_criteria && self.criteria.is_between();

        if self.validate.is_formula() {
            if is_between {
                if self.minimum_formula.is_none() {
                    warn!("data_validation_cell()/_range(): minimum_formula parameter cannot be empty.");
                    return Err(XlsxError::ParameterValidation);
                }
                if self.maximum_formula.is_none() {
                    warn!("data_validation_cell()/_range(): maximum_formula parameter cannot be empty.");
                    return Err(XlsxError::ParameterValidation);
                }
            } else if self.value_formula.is_none() {
                warn!("data_validation_cell()/_range(): formula parameter cannot be empty.");
                return Err(XlsxError::ParameterValidation);
            }
        }

        check_length(&self.input_title, MAX_TITLE_LEN, "input_title")?;
        check_length(&self.error_title, MAX_TITLE_LEN, "error_title")?;
        check_length(&self.input_message, MAX_STRING_LEN, "input_message")?;
        check_length(&self.error_message, MAX_STRING_LEN, "error_message")?;

        if self.validate == ValidationType::List {
            let length = list_length(&self.value_list);
            if length == 0 {
                warn!("data_validation_cell()/_range(): list parameters cannot be zero.");
                return Err(XlsxError::ParameterValidation);
            }
            if length > MAX_STRING_LEN {
                warn!(
                    "data_validation_cell()/_range(): list length with commas > Excel limit of {}.",
                    MAX_STRING_LEN
                );
                return Err(XlsxError::String255LengthExceeded);
            }
        }

        Ok(true)
    }

    /// Normalize into the stored form. Call `check` first.
    pub(crate) fn to_stored(&self, sqref: String) -> StoredValidation {
        let has_criteria = self.validate.has_criteria();
        let is_between = has_criteria && self.criteria.is_between();
        let owned = |s: &Option<String>| s.as_deref().map(|s| strip_formula(s).to_string());

        let mut stored = StoredValidation {
            validate: self.validate,
            criteria: if has_criteria { self.criteria } else { ValidationCriteria::None },
            error_type: self.error_type,
            ignore_blank: self.ignore_blank,
            dropdown: self.dropdown,
            show_input: self.show_input,
            show_error: self.show_error,
            value_number: self.value_number,
            maximum_number: 0.0,
            value_formula: None,
            maximum_formula: None,
            input_title: self.input_title.clone(),
            input_message: self.input_message.clone(),
            error_title: self.error_title.clone(),
            error_message: self.error_message.clone(),
            sqref,
        };

        if is_between {
            stored.value_number = self.minimum_number;
            stored.maximum_number = self.maximum_number;
        }

        if self.validate.is_formula() {
            if is_between {
                stored.value_formula = owned(&self.minimum_formula);
                stored.maximum_formula = owned(&self.maximum_formula);
            } else {
                stored.value_formula = owned(&self.value_formula);
            }
        }

        if self.validate == ValidationType::List {
            stored.value_formula = Some(format!("\"{}\"", self.value_list.join(",")));
        }

        if matches!(self.validate, ValidationType::Date | ValidationType::Time) {
            if is_between {
                stored.value_number = datetime_to_excel_date(&self.minimum_datetime, false);
                stored.maximum_number = datetime_to_excel_date(&self.maximum_datetime, false);
            } else {
                stored.value_number = datetime_to_excel_date(&self.value_datetime, false);
            }
        }

        stored
    }
}

fn write_data_validation(writer: &mut XmlWriter, validation: &StoredValidation) {
    let is_between = validation.criteria.is_between();
    let mut attrs = vec![Attr::str("type", validation.validate.xml_name())];

    if let Some(operator) = validation.criteria.operator() {
        attrs.push(Attr::str("operator", operator));
    }
    match validation.error_type {
        ValidationErrorType::Warning => attrs.push(Attr::str("errorStyle", "warning")),
        ValidationErrorType::Information => attrs.push(Attr::str("errorStyle", "information")),
        ValidationErrorType::Stop => {}
    }
    if validation.ignore_blank {
        attrs.push(Attr::int("allowBlank", 1));
    }
    // Excel's flag is inverted: showDropDown=1 hides the in-cell arrow.
    if !validation.dropdown {
        attrs.push(Attr::int("showDropDown", 1));
    }
    if validation.show_input {
        attrs.push(Attr::int("showInputMessage", 1));
    }
    if validation.show_error {
        attrs.push(Attr::int("showErrorMessage", 1));
    }
    if let Some(title) = &validation.error_title {
        attrs.push(Attr::str("errorTitle", title.as_str()));
    }
    if let Some(message) = &validation.error_message {
        attrs.push(Attr::str("error", message.as_str()));
    }
    if let Some(title) = &validation.input_title {
        attrs.push(Attr::str("promptTitle", title.as_str()));
    }
    if let Some(message) = &validation.input_message {
        attrs.push(Attr::str("prompt", message.as_str()));
    }
    attrs.push(Attr::str("sqref", validation.sqref.as_str()));

    if validation.validate == ValidationType::Any {
        writer.empty_tag("dataValidation", &attrs);
        return;
    }

    writer.start_tag("dataValidation", &attrs);
    match validation.validate {
        ValidationType::Integer
        | ValidationType::Decimal
        | ValidationType::Length
        | ValidationType::Date
        | ValidationType::Time
        | ValidationType::DateNumber
        | ValidationType::TimeNumber => {
            writer.data_element("formula1", &format_f64(validation.value_number), &[]);
            if is_between {
                writer.data_element("formula2", &format_f64(validation.maximum_number), &[]);
            }
        }
        _ => {
            writer.data_element("formula1", validation.value_formula.as_deref().unwrap_or(""), &[]);
            if is_between {
                writer.data_element(
                    "formula2",
                    validation.maximum_formula.as_deref().unwrap_or(""),
                    &[],
                );
            }
        }
    }
    writer.end_tag("dataValidation");
}

pub(crate) fn write_data_validations(writer: &mut XmlWriter, validations: &[StoredValidation]) {
    if validations.is_empty() {
        return;
    }

    writer.start_tag("dataValidations", &[Attr::int("count", validations.len() as i64)]);
    for validation in validations {
        write_data_validation(writer, validation);
    }
    writer.end_tag("dataValidations");
}

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

pub use crate::error::strerror;

pub const ROW_MAX: u32 = 1_048_576;
pub const COL_MAX: u16 = 16_384;

/// A calendar date/time as written into cells. `year == 0` marks a time
/// without a date.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub min: u32,
    pub sec: f64,
}

impl DateTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: f64) -> Self {
        Self { year, month, day, hour, min, sec }
    }

    pub fn from_date(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day, ..Default::default() }
    }

    pub fn from_time(hour: u32, min: u32, sec: f64) -> Self {
        Self { hour, min, sec, ..Default::default() }
    }
}

impl From<NaiveDateTime> for DateTime {
    fn from(dt: NaiveDateTime) -> Self {
        let sec = dt.second() as f64 + dt.nanosecond() as f64 / 1e9;
        Self::new(dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), sec)
    }
}

impl From<NaiveDate> for DateTime {
    fn from(d: NaiveDate) -> Self {
        Self::from_date(d.year(), d.month(), d.day())
    }
}

/// Zero-allocation column letter writing - returns length written
#[inline(always)]
pub fn write_col_letter(col: u16, buf: &mut [u8; 4]) -> usize {
    // 1-based so that the remainder maps cleanly onto A..Z
    let mut n = col as u32 + 1;
    let mut stack = [0u8; 4];
    let mut depth = 0;

    while n > 0 {
        let rem = (n - 1) % 26;
        stack[depth] = b'A' + rem as u8;
        depth += 1;
        n = (n - 1) / 26;
    }

    for i in 0..depth {
        buf[i] = stack[depth - 1 - i];
    }
    depth
}

pub fn col_to_name(col: u16, absolute: bool) -> String {
    let mut letters = [0u8; 4];
    let len = write_col_letter(col, &mut letters);
    let mut name = String::with_capacity(len + 1);
    if absolute {
        name.push('$');
    }
    for &b in &letters[..len] {
        name.push(b as char);
    }
    name
}

/// Write cell reference (e.g. "A1", "B2") to buffer
#[inline(always)]
pub fn write_cell_ref(row: u32, col: u16, buf: &mut Vec<u8>) {
    let mut col_buf = [0u8; 4];
    let col_len = write_col_letter(col, &mut col_buf);
    buf.extend_from_slice(&col_buf[..col_len]);
    buf.extend_from_slice(itoa::Buffer::new().format(row as u64 + 1).as_bytes());
}

pub fn rowcol_to_cell(row: u32, col: u16) -> String {
    rowcol_to_cell_abs(row, col, false, false)
}

pub fn rowcol_to_cell_abs(row: u32, col: u16, abs_row: bool, abs_col: bool) -> String {
    let mut cell = col_to_name(col, abs_col);
    if abs_row {
        cell.push('$');
    }
    cell.push_str(itoa::Buffer::new().format(row as u64 + 1));
    cell
}

/// `A1:C5`, or a single cell when both corners coincide.
pub fn rowcol_to_range(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> String {
    let mut range = rowcol_to_cell(first_row, first_col);
    if first_row == last_row && first_col == last_col {
        return range;
    }
    range.push(':');
    range.push_str(&rowcol_to_cell(last_row, last_col));
    range
}

/// `$A$1:$C$5`, or a single cell when both corners coincide.
pub fn rowcol_to_range_abs(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> String {
    let mut range = rowcol_to_cell_abs(first_row, first_col, true, true);
    if first_row == last_row && first_col == last_col {
        return range;
    }
    range.push(':');
    range.push_str(&rowcol_to_cell_abs(last_row, last_col, true, true));
    range
}

/// `'Sheet 1'!$A$1:$C$5`
pub fn rowcol_to_formula_abs(
    sheetname: &str,
    first_row: u32,
    first_col: u16,
    last_row: u32,
    last_col: u16,
) -> String {
    let mut formula = quote_sheetname(sheetname);
    formula.push('!');
    formula.push_str(&rowcol_to_range_abs(first_row, first_col, last_row, last_col));
    formula
}

/// Zero-indexed row of an A1 reference. Column letters and `$` are skipped;
/// a reference without digits maps to row 0. Rows too large for `u32`
/// saturate, so callers compare the result against [`ROW_MAX`].
pub fn name_to_row(name: &str) -> u32 {
    let digits = name.trim_start_matches(|c: char| !c.is_ascii_digit());
    let mut row: u32 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        row = row
            .checked_mul(10)
            .and_then(|r| r.checked_add(u32::from(b - b'0')))
            .unwrap_or(u32::MAX);
    }
    row.saturating_sub(1)
}

/// Zero-indexed column of an A1 reference. Leading `$` markers are ignored.
/// The result is not clamped to [`COL_MAX`]; overlong letter runs saturate.
pub fn name_to_col(name: &str) -> u32 {
    let mut col: u32 = 0;
    for b in name.bytes() {
        match b {
            b'$' => continue,
            b'A'..=b'Z' => {
                col = col
                    .checked_mul(26)
                    .and_then(|c| c.checked_add(u32::from(b - b'A' + 1)))
                    .unwrap_or(u32::MAX);
            }
            _ => break,
        }
    }
    col.saturating_sub(1)
}

/// Row of the second cell in an `A1:C5` range.
pub fn name_to_row_2(range: &str) -> u32 {
    match range.split_once(':') {
        Some((_, last)) => name_to_row(last),
        None => name_to_row(range),
    }
}

/// Column of the second cell in an `A1:C5` range.
pub fn name_to_col_2(range: &str) -> u32 {
    match range.split_once(':') {
        Some((_, last)) => name_to_col(last),
        None => name_to_col(range),
    }
}

/// Convert a date/time to an Excel serial number in the 1900 or 1904 epoch.
/// The phantom 1900-02-29 is kept so serials match Excel's own.
pub fn datetime_to_excel_date(datetime: &DateTime, date_1904: bool) -> f64 {
    let mut year = datetime.year;
    let mut month = datetime.month as i32;
    let mut day = datetime.day as i32;
    let epoch = if date_1904 { 1904 } else { 1900 };
    let offset = if date_1904 { 4 } else { 0 };
    let norm = 300;
    let mut mdays = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut leap = 0;

    if year == 0 {
        if date_1904 {
            year = 1904;
            month = 1;
            day = 1;
        } else {
            year = 1899;
            month = 12;
            day = 31;
        }
    }

    let seconds = (datetime.hour as f64 * 3600.0 + datetime.min as f64 * 60.0 + datetime.sec)
        / (24.0 * 60.0 * 60.0);

    if !date_1904 {
        if year == 1899 && month == 12 && day == 31 {
            return seconds;
        }
        if year == 1900 && month == 1 && day == 0 {
            return seconds;
        }
        if year == 1900 && month == 2 && day == 29 {
            return 60.0 + seconds;
        }
    }

    let range = year - epoch;

    if year % 4 == 0 && (year % 100 > 0 || year % 400 == 0) {
        leap = 1;
        mdays[2] = 29;
    }

    let mut days: i32 = mdays.iter().take(month.clamp(0, 13) as usize).sum();
    days += day;
    days += range * 365;
    days += range / 4;
    days -= (range + offset) / 100;
    days += (range + offset + norm) / 400;
    days -= leap;

    if !date_1904 && days > 59 {
        days += 1;
    }

    days as f64 + seconds
}

/// Character count of a UTF-8 string, which is what Excel's limits measure.
#[inline]
pub fn utf8_strlen(s: &str) -> usize {
    s.chars().count()
}

/// Quote a sheet name for use in a formula if it contains anything other
/// than ASCII alphanumerics, `_` or `.`. Embedded quotes are doubled.
pub fn quote_sheetname(name: &str) -> String {
    if name.starts_with('\'') {
        return name.to_string();
    }

    let needs_quoting = name
        .bytes()
        .any(|b| !b.is_ascii_alphanumeric() && b != b'_' && b != b'.');

    if !needs_quoting {
        return name.to_string();
    }

    format!("'{}'", name.replace('\'', "''"))
}

/// Strip surrounding quotes from a sheet reference, undoing `quote_sheetname`.
pub fn unquote_sheetname(name: &str) -> String {
    match name.strip_prefix('\'').and_then(|n| n.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => name.to_string(),
    }
}

/// Formulas are stored without their leading `=`.
#[inline]
pub fn strip_formula(formula: &str) -> &str {
    formula.strip_prefix('=').unwrap_or(formula)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_name() {
        assert_eq!(col_to_name(0, false), "A");
        assert_eq!(col_to_name(25, false), "Z");
        assert_eq!(col_to_name(26, false), "AA");
        assert_eq!(col_to_name(701, false), "ZZ");
        assert_eq!(col_to_name(702, false), "AAA");
        assert_eq!(col_to_name(16_383, false), "XFD");
        assert_eq!(col_to_name(2, true), "$C");
    }

    #[test]
    fn test_cell_refs() {
        assert_eq!(rowcol_to_cell(0, 0), "A1");
        assert_eq!(rowcol_to_cell(0, 26), "AA1");
        assert_eq!(rowcol_to_cell(99, 0), "A100");
        assert_eq!(rowcol_to_cell_abs(4, 1, true, false), "B$5");
        assert_eq!(rowcol_to_cell_abs(4, 1, false, true), "$B5");
        assert_eq!(rowcol_to_range(0, 0, 4, 2), "A1:C5");
        assert_eq!(rowcol_to_range(3, 3, 3, 3), "D4");
        assert_eq!(rowcol_to_range_abs(0, 0, 4, 2), "$A$1:$C$5");
        assert_eq!(rowcol_to_formula_abs("Sheet1", 0, 0, 2, 0), "Sheet1!$A$1:$A$3");
        assert_eq!(rowcol_to_formula_abs("My Data", 1, 1, 1, 1), "'My Data'!$B$2");
    }

    #[test]
    fn test_write_cell_ref() {
        let mut buf = Vec::new();
        write_cell_ref(9, 27, &mut buf);
        assert_eq!(buf, b"AB10");
    }

    #[test]
    fn test_name_to_rowcol() {
        assert_eq!(name_to_row("A1"), 0);
        assert_eq!(name_to_col("A1"), 0);
        assert_eq!(name_to_row("$AA$100"), 99);
        assert_eq!(name_to_col("$AA$100"), 26);
        assert_eq!(name_to_col("XFD1048576"), 16_383);
        assert_eq!(name_to_row("XFD1048576"), 1_048_575);
        assert_eq!(name_to_row_2("A1:C5"), 4);
        assert_eq!(name_to_col_2("$A$1:$C$5"), 2);
        assert_eq!(name_to_row_2("B7"), 6);
        assert_eq!(name_to_row("A0"), 0);
    }

    #[test]
    fn test_name_to_rowcol_out_of_range() {
        assert_eq!(name_to_col("XFE1"), u32::from(COL_MAX));
        assert_eq!(name_to_col("ZZZZ1"), 475_253);
        assert_eq!(name_to_col("ZZZZZZZZ1"), u32::MAX - 1);
        assert_eq!(name_to_col("$ZZZZZZZZZZZZ$1"), u32::MAX - 1);
        assert_eq!(name_to_row("A1048577"), ROW_MAX);
        assert_eq!(name_to_row("A99999999999"), u32::MAX - 1);
    }

    #[test]
    fn test_excel_dates_1900() {
        let d = |y, m, dd| datetime_to_excel_date(&DateTime::from_date(y, m, dd), false);
        assert_eq!(d(1899, 12, 31), 0.0);
        assert_eq!(d(1900, 1, 1), 1.0);
        assert_eq!(d(1900, 2, 28), 59.0);
        assert_eq!(d(1900, 2, 29), 60.0);
        assert_eq!(d(1900, 3, 1), 61.0);
        assert_eq!(d(2000, 1, 1), 36526.0);
        assert_eq!(d(2013, 1, 1), 41275.0);
        assert_eq!(d(9999, 12, 31), 2958465.0);
    }

    #[test]
    fn test_excel_dates_1904() {
        let d = |y, m, dd| datetime_to_excel_date(&DateTime::from_date(y, m, dd), true);
        assert_eq!(d(1904, 1, 1), 0.0);
        assert_eq!(d(1904, 1, 2), 1.0);
        assert_eq!(d(2000, 1, 1), 35064.0);
    }

    #[test]
    fn test_excel_times() {
        let noon = DateTime::from_time(12, 0, 0.0);
        assert_eq!(datetime_to_excel_date(&noon, false), 0.5);
        let dt = DateTime::new(1900, 2, 29, 6, 0, 0.0);
        assert_eq!(datetime_to_excel_date(&dt, false), 60.25);
        let dt = DateTime::new(2013, 1, 1, 18, 0, 0.0);
        assert_eq!(datetime_to_excel_date(&dt, false), 41275.75);
    }

    #[test]
    fn test_datetime_from_chrono() {
        let naive = NaiveDate::from_ymd_opt(2014, 3, 17)
            .unwrap()
            .and_hms_opt(8, 30, 15)
            .unwrap();
        let dt = DateTime::from(naive);
        assert_eq!(dt, DateTime::new(2014, 3, 17, 8, 30, 15.0));
    }

    #[test]
    fn test_quote_sheetname() {
        assert_eq!(quote_sheetname("Sheet1"), "Sheet1");
        assert_eq!(quote_sheetname("Sheet.2"), "Sheet.2");
        assert_eq!(quote_sheetname("Sheet 2"), "'Sheet 2'");
        assert_eq!(quote_sheetname("Quote's"), "'Quote''s'");
        assert_eq!(quote_sheetname("'Already'"), "'Already'");
        assert_eq!(quote_sheetname("Données"), "'Données'");
        assert_eq!(unquote_sheetname("'Quote''s'"), "Quote's");
        assert_eq!(unquote_sheetname("Sheet1"), "Sheet1");
    }

    #[test]
    fn test_utf8_strlen() {
        assert_eq!(utf8_strlen("abc"), 3);
        assert_eq!(utf8_strlen("Δείγμα"), 6);
        assert_eq!(utf8_strlen(""), 0);
    }
}

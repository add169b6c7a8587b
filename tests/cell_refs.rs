use proptest::prelude::*;
use xlsxcore::utility::{
    col_to_name, name_to_col, name_to_col_2, name_to_row, name_to_row_2, rowcol_to_cell,
    rowcol_to_cell_abs, rowcol_to_range, strerror,
};
use xlsxcore::{XlsxError, COL_MAX, ROW_MAX};

proptest! {
    #[test]
    fn cell_reference_round_trip(row in 0..ROW_MAX, col in 0..COL_MAX) {
        let cell = rowcol_to_cell(row, col);
        prop_assert_eq!(name_to_row(&cell), row);
        prop_assert_eq!(name_to_col(&cell), u32::from(col));

        let absolute = rowcol_to_cell_abs(row, col, true, true);
        prop_assert_eq!(name_to_row(&absolute), row);
        prop_assert_eq!(name_to_col(&absolute), u32::from(col));
    }

    #[test]
    fn range_reference_round_trip(
        first_row in 0..ROW_MAX,
        first_col in 0..COL_MAX,
        rows in 1u32..1000,
        cols in 1u16..100,
    ) {
        let last_row = (first_row + rows).min(ROW_MAX - 1);
        let last_col = (first_col + cols).min(COL_MAX - 1);
        prop_assume!(last_row != first_row || last_col != first_col);

        let range = rowcol_to_range(first_row, first_col, last_row, last_col);
        prop_assert_eq!(name_to_row(&range), first_row);
        prop_assert_eq!(name_to_col(&range), u32::from(first_col));
        prop_assert_eq!(name_to_row_2(&range), last_row);
        prop_assert_eq!(name_to_col_2(&range), u32::from(last_col));
    }
}

#[test]
fn column_names_at_the_edges() {
    assert_eq!(col_to_name(0, false), "A");
    assert_eq!(col_to_name(25, false), "Z");
    assert_eq!(col_to_name(26, false), "AA");
    assert_eq!(col_to_name(COL_MAX - 1, true), "$XFD");
    assert_eq!(rowcol_to_cell(ROW_MAX - 1, COL_MAX - 1), "XFD1048576");
}

#[test]
fn error_codes_map_to_messages() {
    assert_eq!(strerror(0), "No error.");
    assert_eq!(strerror(XlsxError::SheetnameAlreadyUsed.code()), "Worksheet name is already in use.");
    assert_eq!(strerror(XlsxError::WorksheetIndexOutOfRange.code()), XlsxError::WorksheetIndexOutOfRange.to_string());
    assert_eq!(strerror(250), "Unknown error number.");
}

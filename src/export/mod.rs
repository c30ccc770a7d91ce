//! Spreadsheet exports: daily CSV sheet and operational item rows

mod items;
mod jet2;
mod sheet;

pub use items::{build_comment, operational_item_row, parse_pax, remarks_row, ROW_WIDTH};
pub use jet2::{format_jet2, from_jet2, parse_jet2, to_jet2};
pub use sheet::{rows_to_csv, to_sheet_rows, SheetRow, SHEET_COLUMNS};

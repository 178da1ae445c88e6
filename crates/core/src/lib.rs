pub mod account;
pub mod cell;
pub mod money;
pub mod table;

pub use account::AccountKind;
pub use cell::{CellValue, DATETIME_FORMAT};
pub use money::Amount;
pub use table::{columns, EnrichedRow, EnrichedTable, GridError, NormalizedTable, RawTable};

//! Rule-based field extractors for HTML invoices.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod summary;

pub use amounts::{detect_currency, parse_amount, round2};
pub use dates::{find_date, find_iso_date};
pub use patterns::*;
pub use summary::{classify_row, SummaryAmounts, SummaryRow};

//! CSV reading utilities.

mod reader;

pub use reader::{check_record_schema, read_headers, read_record_frame, validate_encoding};

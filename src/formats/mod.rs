mod builtin;
mod catalog;

pub use builtin::builtin_formats;
pub use catalog::{FormatCatalog, FormatSummary, DEFAULT_FORMAT_KEY, FORMATS_KEY};

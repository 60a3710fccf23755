//! Input parsing and structural filtering.

mod parser;
mod source;
mod structural;

pub use parser::{ParsedInput, Parser, ParserConfig};
pub use source::SourceMetadata;
pub use structural::{FilteredRows, RawRow, StructuralFilter};

use parser::read_file;

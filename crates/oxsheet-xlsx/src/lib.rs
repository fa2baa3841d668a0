//! # oxsheet-xlsx
//!
//! XLSX (Office Open XML) reader and writer for oxsheet.
//!
//! The writer turns a [`oxsheet_core::Workbook`] into named XML parts and
//! hands them to a [`PartSink`]; the reader pulls parts from a
//! [`PartSource`] and rebuilds the workbook. Zip containers and in-memory
//! packages implement both traits.
//!
//! ```rust
//! use oxsheet_core::Workbook;
//! use oxsheet_xlsx::{MemoryPackage, ReadOptions, XlsxReader, XlsxWriter};
//!
//! let mut workbook = Workbook::new();
//! workbook.worksheet_mut(0).unwrap().add_cell("hello", "A1", None).unwrap();
//!
//! let mut package = MemoryPackage::new();
//! XlsxWriter::write_to(&mut workbook, &mut package).unwrap();
//! let loaded = XlsxReader::read_from(&mut package, &ReadOptions::default()).unwrap();
//! assert_eq!(
//!     loaded.worksheet(0).unwrap().get_value("A1").unwrap().as_string(),
//!     Some("hello")
//! );
//! ```

pub mod error;
pub mod options;
pub mod package;
pub mod reader;
pub mod writer;

mod styles;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use options::{ColumnCoercion, GlobalCoercion, ReadOptions};
pub use package::{MemoryPackage, PartSink, PartSource, ZipPackageReader, ZipPackageWriter};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;

//! # kotor_gff - GFF resource codec
//!
//! Reads and writes the `GFF V3.2` generic file format that Aurora engine
//! games use for creatures (`.utc`), items (`.uti`), dialogs (`.dlg`), area
//! instances (`.git`) and most other structured resources.
//!
//! ```
//! use kotor_gff::{FieldPath, Gff, GffValue, read_gff, write_gff};
//!
//! let mut gff = Gff::new(*b"UTC ");
//! gff.root.set("Appearance_Type", GffValue::Word(7));
//!
//! let decoded = read_gff(&write_gff(&gff).unwrap()).unwrap();
//! assert_eq!(
//!     decoded.root.resolve(&FieldPath::parse("Appearance_Type")),
//!     Some(&GffValue::Word(7))
//! );
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod error;
pub mod field;
pub mod reader;
pub mod structure;
pub mod writer;

pub use error::{Error, Result};
pub use field::{FieldType, GffValue, LocalizedString};
pub use reader::{GffHeader, read_gff};
pub use structure::{FieldPath, Gff, GffField, GffStruct, PathSegment, ROOT_STRUCT_ID};
pub use writer::write_gff;

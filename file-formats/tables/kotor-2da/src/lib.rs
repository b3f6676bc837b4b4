//! # kotor_2da - 2DA table codec
//!
//! Reads and writes the binary `2DA V2.b` tables used by Aurora engine games
//! (Knights of the Old Republic I and II) for rule data such as
//! `appearance.2da` or `baseitems.2da`.
//!
//! ```
//! use kotor_2da::{TwoDA, read_2da, write_2da};
//!
//! let mut table = TwoDA::new(["label", "name"]);
//! table.add_row("0", ["human", "135"]);
//!
//! let bytes = write_2da(&table).unwrap();
//! let decoded = read_2da(&bytes).unwrap();
//! assert_eq!(decoded.cell(0, "name"), Some("135"));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod binary;
pub mod error;
pub mod table;

pub use binary::{BINARY_MAGIC, read_2da, write_2da};
pub use error::{Error, Result};
pub use table::{BLANK_CELL, TwoDA, TwoDARow, is_blank};

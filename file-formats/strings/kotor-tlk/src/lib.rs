//! # kotor_tlk - talk table codec
//!
//! Reads and writes `TLK V3.0` talk tables (`dialog.tlk`). Every localized
//! string in the game is addressed by its index in this table, the *strref*.
//!
//! ```
//! use kotor_tlk::{TalkTable, TlkEntry};
//!
//! let mut table = TalkTable::new(0);
//! let strref = table.push(TlkEntry::new("Hello there."));
//!
//! let decoded = TalkTable::read(&table.write().unwrap()).unwrap();
//! assert_eq!(decoded.text(strref), Some("Hello there."));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod error;
pub mod talk_table;

pub use error::{Error, Result};
pub use talk_table::{ENTRY_SIZE, HEADER_SIZE, TLK_MAGIC, TalkTable, TlkEntry};

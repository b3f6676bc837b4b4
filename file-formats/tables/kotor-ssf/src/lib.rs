//! # kotor_ssf - sound set codec
//!
//! Reads and writes `SSF V1.1` sound sets. A sound set maps the 28 creature
//! sound slots (battle cries, pain grunts, ...) to talk-table strrefs.
//!
//! ```
//! use kotor_ssf::{SoundSet, SoundSlot};
//!
//! let mut set = SoundSet::new();
//! set.set(SoundSlot::BattleCry1, Some(10_001));
//!
//! let decoded = SoundSet::read(&set.write().unwrap()).unwrap();
//! assert_eq!(decoded.get(SoundSlot::BattleCry1), Some(10_001));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod error;
pub mod sound_set;

pub use error::{Error, Result};
pub use sound_set::{NO_STRREF, SLOT_COUNT, SSF_MAGIC, SoundSet, SoundSlot};

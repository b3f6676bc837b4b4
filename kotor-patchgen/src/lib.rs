//! kotor-patchgen library
//!
//! Command implementations and the YAML manifest format behind the
//! `kotor-patchgen` binary.

pub mod cli;
pub mod commands;
pub mod manifest;
pub mod utils;

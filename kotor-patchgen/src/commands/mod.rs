//! Command implementations

pub mod compile;
pub mod info;
pub mod scan;

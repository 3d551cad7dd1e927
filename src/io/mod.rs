//! Result exports.

pub mod export;

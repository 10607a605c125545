//! Defines the fixed-width glyph table format produced by `font-converter`.
//!
//! A table is a 4-byte header (`width`, `height`, two reserved zero bytes) followed by one
//! record per printable ASCII character. Records store ink as `0` bits.
//!
//! Includes both read-only and writable interfaces.
#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod glyph;
pub mod table;

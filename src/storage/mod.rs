//! Storage layer: disk I/O and the index file format.
//!
//! This module provides the pager, which reads and writes fixed-size
//! pages of the index file, and the metadata page that pins the file
//! format and records the current root.

mod meta;
mod pager;

pub use meta::{MetaPage, MAGIC};
pub use pager::Pager;

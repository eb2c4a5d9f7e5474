//! A reader for the ITSS compound-archive format — the container behind
//! Microsoft Compiled HTML Help (`.chm`) files and related documents.
//!
//! An archive is a single [`Archive`] handle opened over anything that
//! implements [`ByteSource`] (a blanket impl covers every `Read + Seek`, so
//! a `File` or an in-memory `Cursor` both work out of the box). Opening
//! parses the `ITSF`/`ITSP` headers and the directory of [`Entry`] records;
//! [`Archive::read`] then serves arbitrary byte ranges from any entry,
//! transparently decompressing through the archive's single LZX-compressed
//! stream when the entry lives there.
//!
//! This crate only reads archives: creating or modifying one, verifying
//! signatures, and interpreting the special `#SYSTEM`/`#STRINGS` index
//! entries or HTML content are all out of scope.
//!
//! ```no_run
//! use std::fs::File;
//!
//! # fn main() -> chmitss::Result<()> {
//! let mut archive = chmitss::Archive::open(File::open("help.chm")?)?;
//! if let Some(entry) = archive.get_entry("/index.html").cloned() {
//!     let mut buf = vec![0u8; entry.length() as usize];
//!     archive.read(&entry, 0, &mut buf);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod archive;
mod cache;
mod compression;
mod consts;
mod decompress;
mod directory;
mod error;
mod header;
mod source;
mod unmarshal;

pub use archive::{set_debug_printer, Archive};
pub use consts::{DEFAULT_CACHE_BLOCKS, MAX_CACHE_BLOCKS};
pub use directory::{Entry, EntryFlags, Space};
pub use error::{Error, Result};
pub use source::ByteSource;

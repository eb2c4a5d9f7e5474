use std::fmt;

use crate::consts;
use crate::error::{Error, Result};
use crate::header::{ItsfHeader, ItspHeader};
use crate::source::{read_exact_at, ByteSource};
use crate::unmarshal::Unmarshaller;

/// Which logical stream an entry's `start`/`length` are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Uncompressed,
    Compressed,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Uncompressed => write!(f, "uncompressed"),
            Space::Compressed => write!(f, "compressed"),
        }
    }
}

/// Classification of an entry derived purely from its path, computed once
/// at directory-parse time (see §6 of the format notes: trailing `/`
/// selects `dirs` vs `files`; the second character after a leading `/`
/// selects `special` vs `normal`; no leading `/` means `meta`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags {
    pub dirs: bool,
    pub files: bool,
    pub special: bool,
    pub normal: bool,
    pub meta: bool,
}

impl EntryFlags {
    fn from_path(path: &str) -> EntryFlags {
        let mut flags = EntryFlags::default();
        if path.ends_with('/') {
            flags.dirs = true;
        } else {
            flags.files = true;
        }
        let mut chars = path.chars();
        match chars.next() {
            Some('/') => match chars.next() {
                Some('#') | Some('$') => flags.special = true,
                _ => flags.normal = true,
            },
            _ => flags.meta = true,
        }
        flags
    }
}

/// One entry in the archive's directory.
#[derive(Debug, Clone)]
pub struct Entry {
    path: String,
    space: Space,
    start: u64,
    length: u64,
    flags: EntryFlags,
}

impl Entry {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn space(&self) -> Space {
        self.space
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn path_flags(&self) -> EntryFlags {
        self.flags
    }
}

/// Walks the `PMGL` leaf-page chain starting at `itsp.index_head` and
/// decodes every entry record it finds, in traversal order.
pub(crate) fn parse<S: ByteSource + ?Sized>(
    source: &mut S,
    itsf: &ItsfHeader,
    itsp: &ItspHeader,
) -> Result<Vec<Entry>> {
    let (dir_offset, _dir_len) = crate::header::directory_region(itsf, consts::ITSP_HEADER_LEN);
    let block_len = itsp.block_len as u64;

    let mut entries = Vec::new();
    let mut page_index = itsp.index_head;
    let mut pages_visited = 0u64;
    // Chains on malformed archives could cycle; bound the walk by a
    // generous multiple of the number of pages the directory could
    // plausibly contain.
    let max_pages = (itsf.dir_len / block_len.max(1)) + 2;

    while page_index >= 0 {
        pages_visited += 1;
        if pages_visited > max_pages.max(1) + 16 {
            return Err(Error::malformed("PMGL chain did not terminate"));
        }

        let page_offset = dir_offset + (page_index as u64) * block_len;
        let mut page = vec![0u8; block_len as usize];
        read_exact_at(source, page_offset, &mut page)
            .map_err(|e| Error::malformed(format!("reading directory page: {e}")))?;

        let mut u = Unmarshaller::new(&page);
        let signature = u.signature();
        let free_space = u.u32();
        let _reserved = u.u32();
        let _block_prev = u.i32();
        let block_next = u.i32();
        u.finish()?;

        if signature != consts::PMGL_SIGNATURE {
            return Err(Error::malformed("bad PMGL signature"));
        }
        let header_len = consts::PMGL_HEADER_LEN;
        if free_space as u64 > block_len.saturating_sub(header_len as u64) {
            return Err(Error::malformed("PMGL free_space exceeds page size"));
        }

        let usable_end = block_len as usize - free_space as usize;
        let body = &page[header_len as usize..usable_end];
        parse_page_entries(body, &mut entries)?;

        page_index = block_next;
    }

    if entries.is_empty() {
        return Err(Error::malformed("directory contains no entries"));
    }

    Ok(entries)
}

fn parse_page_entries(body: &[u8], entries: &mut Vec<Entry>) -> Result<()> {
    let mut u = Unmarshaller::new(body);
    while u.remaining() > 0 {
        let name_len = u.cword();
        if name_len as usize > consts::MAX_PATH_LEN {
            return Err(Error::malformed(format!("entry name_len {name_len} too large")));
        }
        let name_bytes = u.bytes(name_len as usize).to_vec();
        let space_tag = u.cword();
        let start = u.cword();
        let length = u.cword();
        if u.is_poisoned() {
            return Err(Error::malformed("directory entry record overruns page"));
        }

        // Paths are an arbitrary byte run on disk, not guaranteed UTF-8;
        // lossily convert rather than failing the whole directory over one
        // oddly-encoded entry (real-world archives do contain these).
        let path = String::from_utf8_lossy(&name_bytes).into_owned();
        let space = match space_tag {
            0 => Space::Uncompressed,
            1 => Space::Compressed,
            other => return Err(Error::malformed(format!("unknown entry space tag {other}"))),
        };
        let flags = EntryFlags::from_path(&path);
        entries.push(Entry { path, space, start, length, flags });
    }
    Ok(())
}

/// Locates an entry by exact path match. Used by `Archive::get_entry` and
/// internally to find the three compression-metadata entries.
pub(crate) fn find<'a>(entries: &'a [Entry], path: &str) -> Option<&'a Entry> {
    entries.iter().find(|e| e.path.eq_ignore_ascii_case(path))
}

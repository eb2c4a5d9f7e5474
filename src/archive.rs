use std::sync::OnceLock;

use crate::cache::BlockCache;
use crate::compression::{self, CompressionContext};
use crate::consts;
use crate::decompress::{Decompressor, LzxdCodec};
use crate::directory::{self, Entry, Space};
use crate::error::Result;
use crate::header::{ItsfHeader, ItspHeader};
use crate::source::ByteSource;

type DebugPrinter = Box<dyn Fn(&str) + Send + Sync>;
static DEBUG_PRINTER: OnceLock<DebugPrinter> = OnceLock::new();

/// Installs a process-wide diagnostic sink, matching the legacy "global
/// debug-printer" surface of the format this crate reads. This has no
/// effect on parsing or decompression — every caller should prefer the
/// ordinary [`log`] facade, which this crate already uses for the same
/// messages; `set_debug_printer` exists only so code written against the
/// older function-pointer-style interface still has somewhere to plug in.
///
/// Only the first call takes effect; later calls are silently ignored.
pub fn set_debug_printer<F>(f: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let _ = DEBUG_PRINTER.set(Box::new(f));
}

pub(crate) fn debug_print(args: std::fmt::Arguments) {
    let msg = args.to_string();
    if let Some(sink) = DEBUG_PRINTER.get() {
        sink(&msg);
    }
    log::debug!("{msg}");
}

/// An open ITSS archive.
///
/// Owns the byte source for its full lifetime; dropping the archive drops
/// the source along with all parsed directory state and cache buffers —
/// there is no separate `close` call in this API, Rust's ownership model
/// makes an explicit teardown step unnecessary.
pub struct Archive<S> {
    source: S,
    itsf: ItsfHeader,
    data_offset: u64,
    entries: Vec<Entry>,
    compression: Option<CompressionContext>,
    decompressor: Option<Decompressor<LzxdCodec>>,
    cache: BlockCache,
}

impl<S: ByteSource> Archive<S> {
    /// Opens an archive: parses the ITSF and ITSP headers, walks the
    /// directory, and — if present — loads the LZXC compression metadata.
    /// A failure at any of the first two steps fails the whole open; a
    /// failure loading compression metadata instead degrades the archive
    /// to uncompressed-only reads (`compression_enabled()` reports false).
    pub fn open(mut source: S) -> Result<Archive<S>> {
        let itsf = ItsfHeader::parse(&mut source)?;
        let itsp = ItspHeader::parse(&mut source, itsf.dir_offset)?;
        let entries = directory::parse(&mut source, &itsf, &itsp)?;
        let compression = compression::load(&mut source, &itsf, &entries);
        let data_offset = itsf.data_offset;

        Ok(Archive {
            source,
            itsf,
            data_offset,
            entries,
            compression,
            decompressor: None,
            cache: BlockCache::new(consts::DEFAULT_CACHE_BLOCKS),
        })
    }

    /// Whether compressed-space reads are available on this archive.
    pub fn compression_enabled(&self) -> bool {
        self.compression.is_some()
    }

    /// Iterates all entries in directory order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Looks up an entry by exact (case-insensitive) path match.
    pub fn get_entry(&self, path: &str) -> Option<&Entry> {
        directory::find(&self.entries, path)
    }

    /// Resizes the block cache. Accepts any `n`; values above
    /// [`consts::MAX_CACHE_BLOCKS`] are silently clamped.
    pub fn set_cache_size(&mut self, n: usize) {
        self.cache.set_capacity(n);
    }

    /// Reads up to `buf.len()` bytes of `entry`'s content starting at
    /// `offset`, returning the number of bytes placed into `buf`.
    ///
    /// This never fails in the `Result`-returning sense: any internal
    /// error (a malformed reset table, a byte-source I/O error, an LZX
    /// decode failure) is logged and collapses to "no more bytes produced
    /// from this call onward" — the same robustness trade spec-wise legacy
    /// implementations of this format make, since malformed archives are
    /// common in the wild and a read API that can panic or abort on them
    /// is not useful.
    pub fn read(&mut self, entry: &Entry, offset: u64, buf: &mut [u8]) -> usize {
        if offset >= entry.length() || buf.is_empty() {
            return 0;
        }
        let max_len = ((entry.length() - offset).min(buf.len() as u64)) as usize;
        let out = &mut buf[..max_len];

        match entry.space() {
            Space::Uncompressed => self.read_uncompressed(entry, offset, out),
            Space::Compressed => self.read_compressed(entry, offset, out),
        }
    }

    fn read_uncompressed(&mut self, entry: &Entry, offset: u64, out: &mut [u8]) -> usize {
        let at = self.data_offset + entry.start() + offset;
        match self.source.read_at(at, out) {
            Ok(n) => n,
            Err(e) => {
                debug_print(format_args!("uncompressed read failed: {e}"));
                0
            }
        }
    }

    fn read_compressed(&mut self, entry: &Entry, offset: u64, out: &mut [u8]) -> usize {
        let Some(ctx) = self.compression else {
            debug_print(format_args!("compressed read requested but compression is unavailable"));
            return 0;
        };

        if self.decompressor.is_none() {
            match LzxdCodec::new(ctx.control.window_size) {
                Ok(codec) => self.decompressor = Some(Decompressor::new(codec)),
                Err(e) => {
                    debug_print(format_args!("failed to initialize LZX decoder: {e}"));
                    return 0;
                }
            }
        }
        let decompressor = self.decompressor.as_mut().unwrap();

        let mut produced = 0usize;
        while produced < out.len() {
            let start = entry.start() + offset + produced as u64;
            let remaining = &mut out[produced..];
            match decompressor.decompress_region(
                &mut self.source,
                &mut self.cache,
                &ctx,
                self.data_offset,
                start,
                remaining,
            ) {
                Ok(0) => break,
                Ok(n) => produced += n,
                Err(e) => {
                    debug_print(format_args!("decompression failed: {e}"));
                    break;
                }
            }
        }
        produced
    }
}

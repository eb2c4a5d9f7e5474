use lzxd::{Lzxd, WindowSize};

use crate::cache::BlockCache;
use crate::compression::CompressionContext;
use crate::consts;
use crate::error::{Error, Result};
use crate::source::{read_exact_at, ByteSource};

/// The shape this crate expects of an LZX decoder: decompress one block at
/// a time, and be able to restart decoding from a clean state at a reset
/// boundary. The `lzxd` crate exposes the first directly but has no
/// explicit "reset" call, so [`LzxdCodec`] realizes one by rebuilding a
/// fresh decoder in place. This indirection also means [`Decompressor`] is
/// unit-testable against a fake codec without needing real LZX-compressed
/// fixtures.
pub(crate) trait LzxCodec {
    fn reset(&mut self);
    fn decompress_block(&mut self, input: &[u8]) -> Result<Vec<u8>>;
}

pub(crate) struct LzxdCodec {
    window_size: WindowSize,
    inner: Lzxd,
}

impl LzxdCodec {
    pub(crate) fn new(window_size_bytes: u32) -> Result<LzxdCodec> {
        let window_size = window_size_for(window_size_bytes)?;
        Ok(LzxdCodec { window_size, inner: Lzxd::new(window_size) })
    }
}

impl LzxCodec for LzxdCodec {
    fn reset(&mut self) {
        self.inner = Lzxd::new(self.window_size);
    }

    fn decompress_block(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.inner
            .decompress_next(input)
            .map(|chunk| chunk.to_vec())
            .map_err(|e| Error::Decompress(e.to_string()))
    }
}

fn window_size_for(value: u32) -> Result<WindowSize> {
    use WindowSize::*;
    Ok(match value {
        0x0000_8000 => KB32,
        0x0001_0000 => KB64,
        0x0002_0000 => KB128,
        0x0004_0000 => KB256,
        0x0008_0000 => KB512,
        0x0010_0000 => MB1,
        0x0020_0000 => MB2,
        0x0040_0000 => MB4,
        0x0080_0000 => MB8,
        0x0100_0000 => MB16,
        0x0200_0000 => MB32,
        other => return Err(Error::unsupported(format!("unsupported LZX window size {other}"))),
    })
}

/// Drives LZX decoding across sequential and random access.
///
/// Owns exactly one codec instance (created lazily by the archive handle on
/// first compressed read — see [`crate::archive::Archive`]) plus a one-slot
/// memo of the most recently decoded block. The memo is deliberately
/// separate from the [`BlockCache`] passed into every method here: it is
/// what keeps a plain sequential read cheap even with the cache capacity
/// set to zero.
pub(crate) struct Decompressor<C: LzxCodec> {
    codec: C,
    last_decoded_block: Option<u32>,
    last_decoded_buffer: Vec<u8>,
}

impl<C: LzxCodec> Decompressor<C> {
    pub(crate) fn new(codec: C) -> Decompressor<C> {
        Decompressor { codec, last_decoded_block: None, last_decoded_buffer: Vec::new() }
    }

    /// Level 1: ensures block `b`'s decompressed bytes are in the memo,
    /// decoding it if necessary and installing a copy into the cache.
    fn uncompress_block<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        cache: &mut BlockCache,
        ctx: &CompressionContext,
        data_offset: u64,
        block: u32,
    ) -> Result<()> {
        if self.last_decoded_block == Some(block) {
            return Ok(());
        }
        if block % ctx.reset_blkcount == 0 {
            self.codec.reset();
        }

        let (cmp_start, cmp_len) = ctx.reset_table.locate(
            source,
            ctx.reset_table_entry_start,
            ctx.content_entry_start,
            data_offset,
            block,
        )?;

        let limit = ctx.reset_table.block_len + consts::LZX_BLOCK_SLACK;
        if cmp_len > limit {
            return Err(Error::malformed(format!(
                "compressed block length {cmp_len} exceeds bound {limit}"
            )));
        }
        let mut scratch = vec![0u8; cmp_len as usize];
        read_exact_at(source, cmp_start, &mut scratch)
            .map_err(|e| Error::malformed(format!("reading compressed block {block}: {e}")))?;

        // The codec is trusted to produce up to `block_len` bytes, fewer
        // only for the very last block of the whole content stream (LZX
        // chunks below the window size are valid there); `decompress_region`
        // clips against whatever length actually comes back rather than
        // assuming every block is exactly `block_len` long.
        let decoded = self.codec.decompress_block(&scratch)?;

        if cache.capacity() > 0 {
            let slot = cache.install(block);
            slot.clear();
            slot.extend_from_slice(&decoded);
        }
        self.last_decoded_block = Some(block);
        self.last_decoded_buffer = decoded;
        Ok(())
    }

    /// Level 2: replays whatever history is needed since the last reset (or
    /// the memoized block, if that shortens the replay) so that block `b`
    /// can be decoded.
    fn decompress_block<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        cache: &mut BlockCache,
        ctx: &CompressionContext,
        data_offset: u64,
        block: u32,
    ) -> Result<()> {
        let mut align = block % ctx.reset_blkcount;
        if let Some(last) = self.last_decoded_block {
            let lower_bound = block - align;
            if last >= lower_bound && last <= block {
                align = block - last;
            }
        }
        let first = block - align;
        for b in first..block {
            self.uncompress_block(source, cache, ctx, data_offset, b)?;
        }
        self.uncompress_block(source, cache, ctx, data_offset, block)
    }

    /// Level 0: fills `out` with up to `out.len()` decompressed bytes
    /// starting at logical offset `start` within the compressed-space
    /// entry, consulting the cache first. Returns the number of bytes
    /// actually produced, which can be less than `out.len()` only when the
    /// block in question is the final, short block of the stream.
    pub(crate) fn decompress_region<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        cache: &mut BlockCache,
        ctx: &CompressionContext,
        data_offset: u64,
        start: u64,
        out: &mut [u8],
    ) -> Result<usize> {
        let block_len = ctx.reset_table.block_len;
        let block = (start / block_len) as u32;
        let off = (start % block_len) as usize;

        if let Some(cached) = cache.lookup(block) {
            let avail = cached.len().saturating_sub(off);
            let n = avail.min(out.len());
            out[..n].copy_from_slice(&cached[off..off + n]);
            return Ok(n);
        }

        self.decompress_block(source, cache, ctx, data_offset, block)?;
        let avail = self.last_decoded_buffer.len().saturating_sub(off);
        let n = avail.min(out.len());
        out[..n].copy_from_slice(&self.last_decoded_buffer[off..off + n]);
        Ok(n)
    }
}

use crate::consts;
use crate::directory::{Entry, Space};
use crate::error::{Error, Result};
use crate::header::ItsfHeader;
use crate::source::{read_exact_at, ByteSource};
use crate::unmarshal::Unmarshaller;

/// Decoded `LZXC` control data, scaled per the version-2 quirk (both
/// `reset_interval` and `window_size` are stored in units of `0x8000` and
/// must be multiplied back out before use).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ControlData {
    pub(crate) reset_interval: u32,
    pub(crate) window_size: u32,
    pub(crate) windows_per_reset: u32,
}

impl ControlData {
    fn parse(buf: &[u8]) -> Result<ControlData> {
        if buf.len() != consts::CONTROL_DATA_LEN_V1 && buf.len() != consts::CONTROL_DATA_LEN_V2 {
            return Err(Error::malformed(format!("unexpected LZXC control data size {}", buf.len())));
        }
        let mut u = Unmarshaller::new(buf);
        let _length = u.u32();
        let signature = u.signature();
        let version = u.u32();
        let mut reset_interval = u.u32();
        let mut window_size = u.u32();
        let windows_per_reset = u.u32();
        u.finish()?;

        if signature != consts::LZXC_SIGNATURE {
            return Err(Error::malformed("bad LZXC signature"));
        }
        if version != 1 && version != 2 {
            return Err(Error::unsupported(format!("LZXC control data version {version}")));
        }
        if version == 2 {
            reset_interval = reset_interval.saturating_mul(0x8000);
            window_size = window_size.saturating_mul(0x8000);
        }
        if window_size <= 1 {
            return Err(Error::unsupported(format!("LZX window_size {window_size}")));
        }
        let half_window = window_size / 2;
        if half_window == 0 || reset_interval == 0 || reset_interval % half_window != 0 {
            return Err(Error::unsupported(
                "LZX reset_interval is not a positive multiple of window_size / 2",
            ));
        }

        Ok(ControlData { reset_interval, window_size, windows_per_reset })
    }

    /// `log2(window_size)`, valid because `window_size` is required to be
    /// a power of two by construction (every known producer emits one,
    /// and non-power-of-two values fail the `window_size / 2` divisibility
    /// check above in practice).
    pub(crate) fn window_bits(&self) -> u32 {
        self.window_size.trailing_zeros()
    }
}

/// Decoded `ResetTable` header. The per-block offset array that follows it
/// in the entry's content is read lazily, block by block, by
/// [`ResetTable::locate`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResetTable {
    pub(crate) block_count: u32,
    pub(crate) table_offset: u32,
    pub(crate) compressed_len: u64,
    pub(crate) block_len: u64,
}

impl ResetTable {
    fn parse(buf: &[u8]) -> Result<ResetTable> {
        if buf.len() != consts::RESET_TABLE_LEN {
            return Err(Error::malformed(format!("unexpected reset table size {}", buf.len())));
        }
        let mut u = Unmarshaller::new(buf);
        let version = u.u32();
        let block_count = u.u32();
        let _entry_size = u.u32();
        let table_offset = u.u32();
        let uncompressed_len = u.u64();
        let compressed_len = u.u64();
        let block_len = u.u64();
        u.finish()?;

        if version != consts::RESET_TABLE_VERSION {
            return Err(Error::unsupported(format!("reset table version {version}")));
        }
        if uncompressed_len > u32::MAX as u64 || compressed_len > u32::MAX as u64 {
            return Err(Error::malformed("reset table lengths exceed 32 bits"));
        }
        if block_len == 0 {
            return Err(Error::malformed("reset table block_len is zero"));
        }

        Ok(ResetTable { block_count, table_offset, compressed_len, block_len })
    }

    /// Resolves block `b` to an absolute file offset and compressed
    /// length within the `Content` stream.
    pub(crate) fn locate<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        reset_table_entry_start: u64,
        content_entry_start: u64,
        data_offset: u64,
        block: u32,
    ) -> Result<(u64, u64)> {
        if block >= self.block_count {
            return Err(Error::malformed(format!("block {block} out of range (have {})", self.block_count)));
        }
        let array_base = data_offset + reset_table_entry_start + self.table_offset as u64;

        let mut entry = [0u8; 8];
        read_exact_at(source, array_base + 8 * block as u64, &mut entry)
            .map_err(|e| Error::malformed(format!("reading reset table entry: {e}")))?;
        let start_in_stream = u64::from_le_bytes(entry);

        let end_in_stream = if block + 1 < self.block_count {
            read_exact_at(source, array_base + 8 * (block as u64 + 1), &mut entry)
                .map_err(|e| Error::malformed(format!("reading reset table entry: {e}")))?;
            u64::from_le_bytes(entry)
        } else {
            self.compressed_len
        };

        if end_in_stream < start_in_stream {
            return Err(Error::malformed("reset table entries are not monotonic"));
        }
        let len = end_in_stream - start_in_stream;
        if len > self.block_len + consts::LZX_BLOCK_SLACK {
            return Err(Error::malformed(format!("compressed block length {len} exceeds bound")));
        }

        let absolute = start_in_stream + data_offset + content_entry_start;
        Ok((absolute, len))
    }
}

/// Everything needed to decompress reads against an archive's single
/// compressed stream; present only when all three metadata entries exist,
/// are themselves uncompressed, and parse successfully.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CompressionContext {
    pub(crate) control: ControlData,
    pub(crate) reset_table: ResetTable,
    pub(crate) reset_table_entry_start: u64,
    pub(crate) content_entry_start: u64,
    /// Number of decompressed blocks between mandatory LZX resets.
    pub(crate) reset_blkcount: u32,
}

/// Attempts to load the compression metadata for an already-parsed
/// directory. Returns `None` (never an error) on any failure — a
/// compressed stream that doesn't load just means the archive degrades to
/// uncompressed-only reads, per the format's own "chicken and egg"
/// bootstrap requirement.
pub(crate) fn load<S: ByteSource + ?Sized>(
    source: &mut S,
    itsf: &ItsfHeader,
    entries: &[Entry],
) -> Option<CompressionContext> {
    match try_load(source, itsf, entries) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::debug!("compression metadata unavailable: {e}");
            None
        }
    }
}

fn try_load<S: ByteSource + ?Sized>(
    source: &mut S,
    itsf: &ItsfHeader,
    entries: &[Entry],
) -> Result<Option<CompressionContext>> {
    let Some(reset_entry) = crate::directory::find(entries, consts::RESET_TABLE_PATH) else {
        return Ok(None);
    };
    let Some(content_entry) = crate::directory::find(entries, consts::CONTENT_PATH) else {
        return Ok(None);
    };
    let Some(control_entry) = crate::directory::find(entries, consts::CONTROL_DATA_PATH) else {
        return Ok(None);
    };
    if reset_entry.space() != Space::Uncompressed || control_entry.space() != Space::Uncompressed
    {
        return Err(Error::malformed("compression metadata entries are not uncompressed"));
    }

    let mut control_buf = vec![0u8; control_entry.length() as usize];
    read_exact_at(source, itsf.data_offset + control_entry.start(), &mut control_buf)
        .map_err(|e| Error::malformed(format!("reading LZXC control data: {e}")))?;
    let control = ControlData::parse(&control_buf)?;

    let mut reset_buf = vec![0u8; reset_entry.length() as usize];
    read_exact_at(source, itsf.data_offset + reset_entry.start(), &mut reset_buf)
        .map_err(|e| Error::malformed(format!("reading reset table: {e}")))?;
    let reset_table = ResetTable::parse(&reset_buf)?;

    let half_window = control.window_size / 2;
    let reset_blkcount = (control.reset_interval / half_window)
        .saturating_mul(control.windows_per_reset.max(1));
    if reset_blkcount == 0 {
        return Err(Error::malformed("derived reset_blkcount is zero"));
    }

    Ok(Some(CompressionContext {
        control,
        reset_table,
        reset_table_entry_start: reset_entry.start(),
        content_entry_start: content_entry.start(),
        reset_blkcount,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control_bytes(version: u32, reset_interval: u32, window_size: u32, windows_per_reset: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"LZXC");
        buf.extend_from_slice(&version.to_le_bytes());
        buf.extend_from_slice(&reset_interval.to_le_bytes());
        buf.extend_from_slice(&window_size.to_le_bytes());
        buf.extend_from_slice(&windows_per_reset.to_le_bytes());
        if version == 2 {
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
        buf
    }

    #[test]
    fn control_data_v2_scales_by_0x8000() {
        let buf = control_bytes(2, 2, 2, 1);
        let control = ControlData::parse(&buf).unwrap();
        assert_eq!(control.window_size, 2 * 0x8000);
        assert_eq!(control.reset_interval, 2 * 0x8000);
        assert_eq!(control.window_bits(), 16);
    }

    #[test]
    fn control_data_rejects_degenerate_window() {
        let buf = control_bytes(1, 0x8000, 1, 1);
        assert!(ControlData::parse(&buf).is_err());
    }

    #[test]
    fn control_data_rejects_non_multiple_reset_interval() {
        let buf = control_bytes(1, 0x9000, 0x8000, 1);
        assert!(ControlData::parse(&buf).is_err());
    }

    fn reset_table_bytes(block_count: u32, table_offset: u32, compressed_len: u64, block_len: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&block_count.to_le_bytes());
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(&table_offset.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&compressed_len.to_le_bytes());
        buf.extend_from_slice(&block_len.to_le_bytes());
        buf
    }

    #[test]
    fn reset_table_locate_resolves_bounds() {
        use std::io::Cursor;
        let table = ResetTable::parse(&reset_table_bytes(3, 0x28, 300, 0x8000)).unwrap();
        // offsets array: three u64 starts at table_offset=0x28 relative to
        // the reset-table entry's own start (here 0, for simplicity).
        let mut archive = vec![0u8; 0x28 + 24];
        let offsets: [u64; 3] = [0, 100, 200];
        for (i, off) in offsets.iter().enumerate() {
            archive[0x28 + i * 8..0x28 + i * 8 + 8].copy_from_slice(&off.to_le_bytes());
        }
        let mut cursor = Cursor::new(archive);
        let (abs, len) = table.locate(&mut cursor, 0, 1000, 0, 1).unwrap();
        assert_eq!(abs, 100 + 1000);
        assert_eq!(len, 100);
        let (abs_last, len_last) = table.locate(&mut cursor, 0, 1000, 0, 2).unwrap();
        assert_eq!(abs_last, 200 + 1000);
        assert_eq!(len_last, 100);
    }

    #[test]
    fn reset_table_locate_rejects_out_of_range_block() {
        use std::io::Cursor;
        let table = ResetTable::parse(&reset_table_bytes(1, 0x28, 10, 0x8000)).unwrap();
        let mut cursor = Cursor::new(vec![0u8; 64]);
        assert!(table.locate(&mut cursor, 0, 0, 0, 5).is_err());
    }
}

use crate::consts;
use crate::error::{Error, Result};
use crate::source::{read_exact_at, ByteSource};
use crate::unmarshal::Unmarshaller;

/// The `ITSF` file header.
#[derive(Debug, Clone)]
pub(crate) struct ItsfHeader {
    pub(crate) version: u32,
    pub(crate) dir_offset: u64,
    pub(crate) dir_len: u64,
    /// Absolute offset of the content payload. Read directly from the
    /// header for v3 archives; for v2, synthesized as `dir_offset +
    /// dir_len` since the field doesn't exist yet in that header layout.
    pub(crate) data_offset: u64,
}

impl ItsfHeader {
    pub(crate) fn parse<S: ByteSource + ?Sized>(source: &mut S) -> Result<ItsfHeader> {
        let mut buf = vec![0u8; consts::ITSF_V3_HEADER_LEN as usize];
        read_exact_at(source, 0, &mut buf)
            .map_err(|e| Error::malformed(format!("reading ITSF header: {e}")))?;

        let mut u = Unmarshaller::new(&buf);
        let signature = u.signature();
        let version = u.u32();
        let header_len = u.u32();
        let _reserved = u.u32();
        let _last_modified = u.u32();
        let _lang_id = u.u32();
        let _uuid1 = u.uuid();
        let _uuid2 = u.uuid();
        let _unknown_offset = u.u64();
        let _unknown_len = u.u64();
        let dir_offset = u.u64();
        let dir_len = u.u64();
        let data_offset_v3 = u.u64();
        u.finish()?;

        if signature != consts::ITSF_SIGNATURE {
            return Err(Error::malformed("not an ITSS archive (bad ITSF signature)"));
        }
        if version != consts::ITSF_VERSION_2 && version != consts::ITSF_VERSION_3 {
            return Err(Error::unsupported(format!("ITSF version {version}")));
        }
        let min_len = if version == consts::ITSF_VERSION_3 {
            consts::ITSF_V3_HEADER_LEN
        } else {
            consts::ITSF_V2_HEADER_LEN
        };
        if header_len < min_len {
            return Err(Error::malformed(format!(
                "ITSF header_len {header_len} too small for version {version}"
            )));
        }
        if dir_offset > u32::MAX as u64 || dir_len > u32::MAX as u64 {
            return Err(Error::malformed("ITSF directory bounds exceed 32 bits"));
        }

        let data_offset =
            if version == consts::ITSF_VERSION_3 { data_offset_v3 } else { dir_offset + dir_len };

        Ok(ItsfHeader { version, dir_offset, dir_len, data_offset })
    }
}

/// The `ITSP` directory header.
#[derive(Debug, Clone)]
pub(crate) struct ItspHeader {
    pub(crate) block_len: u32,
    pub(crate) index_head: i32,
}

impl ItspHeader {
    pub(crate) fn parse<S: ByteSource + ?Sized>(
        source: &mut S,
        at: u64,
    ) -> Result<ItspHeader> {
        let mut buf = vec![0u8; consts::ITSP_HEADER_LEN as usize];
        read_exact_at(source, at, &mut buf)
            .map_err(|e| Error::malformed(format!("reading ITSP header: {e}")))?;

        let mut u = Unmarshaller::new(&buf);
        let signature = u.signature();
        let version = u.u32();
        let header_len = u.u32();
        let _reserved = u.u32();
        let block_len = u.u32();
        let _blockidx_intvl = u.i32();
        let _index_depth = u.i32();
        let _index_root = u.i32();
        let index_head = u.i32();
        let _reserved2 = u.i32();
        let _num_blocks = u.u32();
        let _reserved3 = u.i32();
        let _lang_id = u.u32();
        let _uuid = u.uuid();
        let _reserved4 = u.bytes(16);
        u.finish()?;

        if signature != consts::ITSP_SIGNATURE {
            return Err(Error::malformed("bad ITSP signature"));
        }
        if version != consts::ITSP_VERSION {
            return Err(Error::unsupported(format!("ITSP version {version}")));
        }
        if header_len != consts::ITSP_HEADER_LEN {
            return Err(Error::malformed(format!("unexpected ITSP header_len {header_len}")));
        }
        if block_len == 0 {
            return Err(Error::malformed("ITSP block_len is zero"));
        }

        // `index_root` names the top of the PMGI index for multi-level
        // directories; this core only ever walks the PMGL leaf chain, which
        // always starts at `index_head` regardless of `index_root`.
        Ok(ItspHeader { block_len, index_head })
    }
}

/// The directory region derived from the two headers: `dir_offset` moves
/// past the ITSP header itself, and `dir_len` shrinks to match.
pub(crate) fn directory_region(itsf: &ItsfHeader, itsp_header_len: u32) -> (u64, u64) {
    let dir_offset = itsf.dir_offset + itsp_header_len as u64;
    let dir_len = itsf.dir_len.saturating_sub(itsp_header_len as u64);
    (dir_offset, dir_len)
}

//! Shared archive-fabrication helpers for the integration tests.
//!
//! These build well-formed (or deliberately broken) ITSS byte streams by
//! hand, the same way `mdsteele/rust-cab`'s own integration tests build CAB
//! files by hand rather than shipping binary fixtures.

pub const ITSF_V3_HEADER_LEN: u32 = 0x60;
pub const ITSP_HEADER_LEN: u32 = 0x54;
pub const PMGL_HEADER_LEN: u32 = 0x14;

/// Routes `log` output through `env_logger` so a failing test can be rerun
/// with `RUST_LOG=debug` to see what the archive's diagnostic sink saw.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct EntrySpec {
    pub path: &'static str,
    /// 0 = uncompressed space, 1 = compressed space.
    pub space: u64,
    pub start: u64,
    pub length: u64,
}

fn le32(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}
fn le64(v: u64) -> [u8; 8] {
    v.to_le_bytes()
}

fn push_cword(buf: &mut Vec<u8>, mut value: u64) {
    let mut digits = Vec::new();
    loop {
        digits.push((value & 0x7f) as u8);
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for (i, digit) in digits.iter().rev().enumerate() {
        let is_last = i == digits.len() - 1;
        buf.push(if is_last { *digit } else { digit | 0x80 });
    }
}

fn entry_record(spec: &EntrySpec) -> Vec<u8> {
    let mut buf = Vec::new();
    push_cword(&mut buf, spec.path.len() as u64);
    buf.extend_from_slice(spec.path.as_bytes());
    push_cword(&mut buf, spec.space);
    push_cword(&mut buf, spec.start);
    push_cword(&mut buf, spec.length);
    buf
}

/// Packs entry records into one or more `block_len`-sized PMGL pages,
/// splitting to a new page whenever the next record wouldn't fit, and
/// wires up the `block_next` chain. Returns the concatenated page bytes.
fn build_directory_pages(entries: &[EntrySpec], block_len: u32) -> Vec<u8> {
    let records: Vec<Vec<u8>> = entries.iter().map(entry_record).collect();
    let capacity = (block_len - PMGL_HEADER_LEN) as usize;

    let mut pages: Vec<Vec<Vec<u8>>> = vec![Vec::new()];
    let mut current_len = 0usize;
    for record in records {
        if current_len + record.len() > capacity && !pages.last().unwrap().is_empty() {
            pages.push(Vec::new());
            current_len = 0;
        }
        current_len += record.len();
        pages.last_mut().unwrap().push(record);
    }

    let num_pages = pages.len();
    let mut out = Vec::new();
    for (i, page_records) in pages.into_iter().enumerate() {
        let mut body = Vec::new();
        for record in &page_records {
            body.extend_from_slice(record);
        }
        let free_space = block_len as usize - PMGL_HEADER_LEN as usize - body.len();

        let mut page = Vec::new();
        page.extend_from_slice(b"PMGL");
        page.extend_from_slice(&le32(free_space as u32));
        page.extend_from_slice(&le32(0));
        page.extend_from_slice(&le32(if i == 0 { u32::MAX } else { (i - 1) as u32 }));
        let next = if i + 1 < num_pages { i as u32 + 1 } else { u32::MAX };
        page.extend_from_slice(&le32(next));
        page.extend_from_slice(&body);
        page.resize(block_len as usize, 0);
        out.extend_from_slice(&page);
    }
    out
}

/// Builds a complete ITSS archive (v3 ITSF + ITSP + PMGL directory chain +
/// data area) from entry descriptions and the raw data-area bytes that
/// follow the directory. `entries` must describe every byte range that
/// `data` is expected to serve; this helper does not interpret `space` or
/// validate that `start`/`length` actually line up with `data` — tests
/// that want a malformed archive pass mismatched values deliberately.
pub fn build_archive(entries: &[EntrySpec], block_len: u32, data: &[u8]) -> Vec<u8> {
    let pages = build_directory_pages(entries, block_len);
    let first_index_head = 0i32;

    let itsp_offset = ITSF_V3_HEADER_LEN as u64;
    let mut itsp = Vec::new();
    itsp.extend_from_slice(b"ITSP");
    itsp.extend_from_slice(&le32(1));
    itsp.extend_from_slice(&le32(ITSP_HEADER_LEN));
    itsp.extend_from_slice(&le32(0));
    itsp.extend_from_slice(&le32(block_len));
    itsp.extend_from_slice(&le32(0)); // blockidx_intvl
    itsp.extend_from_slice(&le32(0)); // index_depth
    itsp.extend_from_slice(&le32(u32::MAX)); // index_root = -1
    itsp.extend_from_slice(&le32(first_index_head as u32)); // index_head
    itsp.extend_from_slice(&le32(0));
    itsp.extend_from_slice(&le32((pages.len() as u32) / block_len)); // num_blocks
    itsp.extend_from_slice(&le32(0));
    itsp.extend_from_slice(&le32(0)); // lang_id
    itsp.extend_from_slice(&[0u8; 16]);
    itsp.extend_from_slice(&[0u8; 16]);
    assert_eq!(itsp.len() as u64, ITSP_HEADER_LEN as u64);

    let dir_len = ITSP_HEADER_LEN as u64 + pages.len() as u64;
    let data_offset = itsp_offset + dir_len;

    let mut itsf = Vec::new();
    itsf.extend_from_slice(b"ITSF");
    itsf.extend_from_slice(&le32(3));
    itsf.extend_from_slice(&le32(ITSF_V3_HEADER_LEN));
    itsf.extend_from_slice(&le32(0));
    itsf.extend_from_slice(&le32(0));
    itsf.extend_from_slice(&le32(0));
    itsf.extend_from_slice(&[0u8; 16]);
    itsf.extend_from_slice(&[0u8; 16]);
    itsf.extend_from_slice(&le64(0));
    itsf.extend_from_slice(&le64(0));
    itsf.extend_from_slice(&le64(itsp_offset));
    itsf.extend_from_slice(&le64(dir_len));
    itsf.extend_from_slice(&le64(data_offset));
    assert_eq!(itsf.len() as u64, ITSF_V3_HEADER_LEN as u64);

    let mut archive = Vec::new();
    archive.extend_from_slice(&itsf);
    archive.extend_from_slice(&itsp);
    archive.extend_from_slice(&pages);
    archive.extend_from_slice(data);
    archive
}

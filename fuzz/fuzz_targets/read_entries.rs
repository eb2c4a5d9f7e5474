#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

// Once an archive opens successfully, every entry it reports must be
// readable end to end without panicking, including compressed entries
// that exercise the reset-table lookup and LZX decompression driver.
fuzz_target!(|data: &[u8]| {
    if let Ok(mut archive) = chmitss::Archive::open(Cursor::new(data.to_vec())) {
        let entries: Vec<_> = archive.entries().cloned().collect();
        for entry in entries {
            let mut buf = vec![0u8; entry.length().min(1 << 20) as usize];
            let _ = archive.read(&entry, 0, &mut buf);
        }
    }
});

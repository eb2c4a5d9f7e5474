#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

// Feeds arbitrary bytes straight through the header, ITSP, and directory
// parsers. `Archive::open` must never panic on hostile input; it either
// succeeds or returns an `Error`.
fuzz_target!(|data: &[u8]| {
    let _ = chmitss::Archive::open(Cursor::new(data.to_vec()));
});

use std::io::{self, Read, Seek, SeekFrom};

/// The byte-source abstraction every archive reads through.
///
/// This mirrors a `pread`-style random-access reader: given an absolute
/// archive offset and a buffer, fill as much of the buffer as possible and
/// report how many bytes were produced. Anything that can seek and read —
/// a file, an in-memory buffer, a memory-mapped region — implements this
/// crate's needs through the blanket impl below; callers never need to
/// implement `ByteSource` themselves unless they have something unusual to
/// back an archive with.
pub trait ByteSource {
    /// Reads up to `buf.len()` bytes starting at absolute offset `at`.
    ///
    /// Returns the number of bytes actually placed into `buf`. A short read
    /// is not itself an error; callers that require an exact size check the
    /// returned count themselves.
    fn read_at(&mut self, at: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Read + Seek + ?Sized> ByteSource for T {
    fn read_at(&mut self, at: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.seek(SeekFrom::Start(at))?;
        let mut total = 0;
        while total < buf.len() {
            match self.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

/// Reads exactly `buf.len()` bytes at absolute offset `at`, failing if the
/// source runs dry first.
///
/// Several parsers in this crate (headers, the directory, the reset table)
/// require an exact-size read and treat a short read as a malformed
/// archive rather than a partial result; this is the one place that
/// distinction is enforced.
pub(crate) fn read_exact_at<S: ByteSource + ?Sized>(
    source: &mut S,
    at: u64,
    buf: &mut [u8],
) -> io::Result<()> {
    let n = source.read_at(at, buf)?;
    if n != buf.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes at offset {}, got {}", buf.len(), at, n),
        ));
    }
    Ok(())
}

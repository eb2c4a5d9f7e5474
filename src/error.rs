/// Everything that can go wrong while opening or reading an archive.
///
/// The archive-open path surfaces this type directly. The per-byte read
/// path (`Archive::read`) never does — a runtime error there collapses to
/// "no more bytes from this call", with the underlying cause only reaching
/// [`log`](https://docs.rs/log). See the crate-level docs for the rationale.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The byte source returned an I/O error, or a short read where an
    /// exact size was required.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A signature, version, bound, or sanity check failed while decoding
    /// a structure.
    #[error("malformed archive: {0}")]
    Malformed(String),

    /// The archive uses a variant of the format this crate does not
    /// implement (an ITSF version outside `{2, 3}`, an LZXC reset interval
    /// that isn't a multiple of `window_size / 2`, or a degenerate LZX
    /// window size).
    #[error("unsupported archive variant: {0}")]
    Unsupported(String),

    /// An allocation needed to satisfy a decode could not be made.
    #[error("allocation failed: {0}")]
    Oom(String),

    /// The LZX decoder rejected a block.
    #[error("LZX decompression failed: {0}")]
    Decompress(String),

    /// A compressed-space read was attempted on an archive whose
    /// compression metadata failed to load (`compression_enabled ==
    /// false`).
    #[error("archive has no usable compression stream")]
    NotApplicable,
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Error {
        Error::Malformed(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Error {
        Error::Unsupported(msg.into())
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

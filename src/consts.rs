// ========================================================================= //

pub(crate) const ITSF_SIGNATURE: [u8; 4] = *b"ITSF";
pub(crate) const ITSP_SIGNATURE: [u8; 4] = *b"ITSP";
pub(crate) const PMGL_SIGNATURE: [u8; 4] = *b"PMGL";
pub(crate) const LZXC_SIGNATURE: [u8; 4] = *b"LZXC";

pub(crate) const ITSF_VERSION_2: u32 = 2;
pub(crate) const ITSF_VERSION_3: u32 = 3;

pub(crate) const ITSF_V2_HEADER_LEN: u32 = 0x58;
pub(crate) const ITSF_V3_HEADER_LEN: u32 = 0x60;

pub(crate) const ITSP_VERSION: u32 = 1;
pub(crate) const ITSP_HEADER_LEN: u32 = 0x54;

pub(crate) const PMGL_HEADER_LEN: u32 = 0x14;

pub(crate) const RESET_TABLE_VERSION: u32 = 2;
pub(crate) const RESET_TABLE_LEN: usize = 0x28;

pub(crate) const CONTROL_DATA_LEN_V1: usize = 0x18;
pub(crate) const CONTROL_DATA_LEN_V2: usize = 0x1c;

/// Upper bound on a compressed block's size above the nominal `block_len`,
/// matching the LZX worst-case expansion for the window sizes this format
/// allows.
pub(crate) const LZX_BLOCK_SLACK: u64 = 6144;

/// Longest entry path this crate will decode; entries naming a longer path
/// are rejected as malformed rather than accepted with an unbounded
/// allocation.
pub(crate) const MAX_PATH_LEN: usize = 512;

/// Default block-cache capacity, matching the archive's own default before
/// any call to `set_cache_size`.
pub const DEFAULT_CACHE_BLOCKS: usize = 5;

/// Hard ceiling on the block cache's capacity regardless of what a caller
/// requests via `set_cache_size`.
pub const MAX_CACHE_BLOCKS: usize = 64;

pub(crate) const RESET_TABLE_PATH: &str =
    "::DataSpace/Storage/MSCompressed/Transform/\
     {7FC28940-9D31-11D0-9B27-00A0C91E9C7C}/InstanceData/ResetTable";
pub(crate) const CONTENT_PATH: &str = "::DataSpace/Storage/MSCompressed/Content";
pub(crate) const CONTROL_DATA_PATH: &str = "::DataSpace/Storage/MSCompressed/ControlData";

// ========================================================================= //

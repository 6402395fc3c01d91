/// Digest recorded for every saved export.
pub const HASH_ALGORITHM: &str = "sha256";

/// Highest ` (n)` suffix tried before giving up on a file name.
pub const MAX_DUPLICATE_SUFFIX: u32 = 999;

/// Longest file-name stem kept, in bytes. Leaves room for a ` (n)` suffix and an
/// extension under the usual 255-byte limit.
pub const MAX_STEM_BYTES: usize = 200;

/// Longest trailing `.ext` treated as an extension when shortening a name.
pub const MAX_EXTENSION_BYTES: usize = 16;

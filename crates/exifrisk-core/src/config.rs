// crates/exifrisk-core/src/config.rs

/// Hard ceiling on [`DecodeLimits::max_ifd_depth`]. Every level of nesting is
/// a stack frame in the directory walk.
pub const IFD_DEPTH_CEILING: usize = 64;

/// Caps applied while decoding and formatting a single file.
///
/// The decoder caps bound the work a corrupt or hostile file can cause: the
/// entry cap stops garbage entry counts, the depth cap together with the
/// visited-offset set stops IFD chains that loop back on themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Directories declaring more entries than this are skipped.
    pub max_ifd_entries: usize,
    /// Maximum nesting of IFD0 -> sub-IFD / next-IFD hops. Values above
    /// [`IFD_DEPTH_CEILING`] are treated as the ceiling.
    pub max_ifd_depth: usize,
    /// Character cap for values rendered as strings (byte blobs, long lists).
    pub max_display_len: usize,
    /// Lists longer than this are rendered as a capped string.
    pub max_list_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_ifd_entries: 100,
            max_ifd_depth: 8,
            max_display_len: 100,
            max_list_len: 32,
        }
    }
}

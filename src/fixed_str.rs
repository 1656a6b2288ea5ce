use binrw::BinRead;
use std::fmt::Debug;

/// A fixed-width, NUL-padded byte string as stored inline in ext4 records
/// (`s_volume_name`, `s_last_mounted`, inode `i_block` as raw bytes, ...).
///
/// Decodes as `as_str()`: UTF-8 up to the first NUL, or the hex fallback
/// (§P6) when the bytes are not valid UTF-8.
#[derive(BinRead, Clone)]
pub struct FixedStr<const N: usize> {
    pub data: [u8; N],
}

impl<const N: usize> FixedStr<N> {
    /// Decodes as UTF-8 up to the first NUL byte (or the whole buffer if
    /// there is none), falling back to a hex dump of the raw bytes when the
    /// content is not valid UTF-8.
    pub fn as_str(&self) -> String {
        let len = self
            .data
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(self.data.len());
        match std::str::from_utf8(&self.data[..len]) {
            Ok(s) => s.to_string(),
            Err(_) => crate::util::hex_string(&self.data[..len]),
        }
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        FixedStr { data: [0u8; N] }
    }
}

impl<const N: usize> Debug for FixedStr<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FixedStr({:?})", self.as_str())
    }
}

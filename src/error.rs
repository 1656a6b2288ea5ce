use thiserror::Error;

/// Errors that can terminate the parse before or during image loading.
///
/// Anomalies encountered while *walking* an already-loaded image (bad magic,
/// implausible `rec_len`, out-of-range inode numbers, ...) are not represented
/// here: the walker is best-effort forensic and reports those through
/// `tracing::warn!` rather than aborting. This enum only covers the hard
/// failure surface described in the crate's error handling design: the
/// initial image read.
#[derive(Debug, Error)]
pub enum Ext4ParseError {
    #[error("image path does not exist: {0}")]
    ImagePathNotFound(String),

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {what} at offset {offset:#x}: {source}")]
    Decode {
        what: &'static str,
        offset: u64,
        #[source]
        source: binrw::Error,
    },
}

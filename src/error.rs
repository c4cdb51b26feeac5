use thiserror::Error;

/// Result type alias for DSK operations
pub type Result<T> = std::result::Result<T, DskError>;

/// Errors that can occur while decoding a DSK image
///
/// Every condition is fatal for the current operation: either the image is
/// malformed or the underlying I/O failed. Nothing is retried.
#[derive(Debug, Error)]
pub enum DskError {
    /// I/O error occurred, or fewer bytes were available than required
    #[error("I/O error: {0}")]
    FileError(#[from] std::io::Error),

    /// Header signature matches neither the standard nor the extended magic
    #[error("Unknown format: signature {0:?}")]
    UnknownFormat(String),

    /// Recognized container but a geometry this crate does not handle
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Track count cannot be represented by the image's track table
    #[error("Too large: track {tracks} requested, track table holds {capacity}")]
    TooLarge {
        /// Requested track count (or index + 1)
        tracks: usize,
        /// Number of tracks the table can address
        capacity: usize,
    },

    /// Track-Info magic missing at the expected offset
    #[error("Malformed track info for track {track} at offset {offset:#x}")]
    MalformedTrackInfo {
        /// Track being read
        track: u8,
        /// Byte offset of the track information block
        offset: u64,
    },

    /// Track-Info block names a different track than the one addressed
    #[error("Unexpected track: expected {expected}, found {found}")]
    UnexpectedTrack {
        /// Track index being read
        expected: u8,
        /// Track number stored in the block
        found: u8,
    },

    /// Track-Info block names a side other than 0
    #[error("Unexpected side {found} on track {track}")]
    UnexpectedSide {
        /// Track index being read
        track: u8,
        /// Side number stored in the block
        found: u8,
    },

    /// Sector size code other than 2 (512 bytes)
    #[error("Unexpected sector size code {code} on track {track}")]
    UnexpectedSectorSize {
        /// Track index being read
        track: u8,
        /// FDC size code found
        code: u8,
    },

    /// Sector count other than 9
    #[error("Unexpected sector count {count} on track {track}")]
    UnexpectedSectorNumber {
        /// Track index being read
        track: u8,
        /// Sector count found
        count: u8,
    },

    /// Sector ID outside the disk class range, or a logical sector with no slot
    #[error("Unexpected sector ID {id:#04x} on track {track}")]
    UnexpectedSectorId {
        /// Track index being read
        track: u8,
        /// Raw sector ID (or logical sector number when unmapped)
        id: u8,
    },
}

impl DskError {
    /// Create an unsupported format error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        DskError::UnsupportedFormat(message.into())
    }

    /// Printable error code, as reported by the command line tool
    pub fn name(&self) -> &'static str {
        match self {
            DskError::FileError(_) => "DSK_FILE_ERROR",
            DskError::UnknownFormat(_) => "DSK_UNKNOWN_FORMAT",
            DskError::UnsupportedFormat(_) => "DSK_UNSUPPORTED_FORMAT",
            DskError::TooLarge { .. } => "DSK_TOO_LARGE",
            DskError::MalformedTrackInfo { .. } => "DSK_MALFORMED_TRACK_INFO",
            DskError::UnexpectedTrack { .. } => "DSK_UNEXPECTED_TRACK",
            DskError::UnexpectedSide { .. } => "DSK_UNEXPECTED_SIDE",
            DskError::UnexpectedSectorSize { .. } => "DSK_UNEXPECTED_SECTOR_SIZE",
            DskError::UnexpectedSectorNumber { .. } => "DSK_UNEXPECTED_SECTOR_NUMBER",
            DskError::UnexpectedSectorId { .. } => "DSK_UNEXPECTED_SECTOR_ID",
        }
    }
}

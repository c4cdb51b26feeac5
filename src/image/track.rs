/// Track information block validation

use crate::error::{DskError, Result};
use crate::format::constants::*;
use std::io::{Read, Seek, SeekFrom};

/// Length of the track info block fields checked here (magic through sector count)
const TRACK_INFO_HEADER_LEN: usize = 0x16;

/// Decoded fields of a track information block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    /// Physical track number stored in the block
    pub track_number: u8,
    /// Physical side number stored in the block
    pub side_number: u8,
    /// FDC sector size code
    pub sector_size_code: u8,
    /// Number of sectors on the track
    pub sector_count: u8,
}

impl TrackInfo {
    /// Sector size in bytes
    pub fn sector_size(&self) -> usize {
        fdc_size_to_bytes(self.sector_size_code)
    }
}

/// Check the track information block at `offset` describes track `track`
///
/// The block must carry the Track-Info magic, the expected track number,
/// side 0, 512-byte sectors and 9 sectors.
pub fn validate_track<R: Read + Seek>(stream: &mut R, offset: u64, track: u8) -> Result<TrackInfo> {
    stream.seek(SeekFrom::Start(offset))?;
    let mut block = [0u8; TRACK_INFO_HEADER_LEN];
    stream.read_exact(&mut block)?;

    if &block[..TRACK_INFO_MARKER.len()] != TRACK_INFO_MARKER {
        return Err(DskError::MalformedTrackInfo { track, offset });
    }

    // 0x0C-0x0F unused, 0x12-0x13 data rate and recording mode (ignored)
    let info = TrackInfo {
        track_number: block[0x10],
        side_number: block[0x11],
        sector_size_code: block[0x14],
        sector_count: block[0x15],
    };

    if info.track_number != track {
        return Err(DskError::UnexpectedTrack {
            expected: track,
            found: info.track_number,
        });
    }
    if info.side_number != 0 {
        return Err(DskError::UnexpectedSide {
            track,
            found: info.side_number,
        });
    }
    if info.sector_size_code != SECTOR_SIZE_CODE {
        return Err(DskError::UnexpectedSectorSize {
            track,
            code: info.sector_size_code,
        });
    }
    if info.sector_count != SECTORS_PER_TRACK {
        return Err(DskError::UnexpectedSectorNumber {
            track,
            count: info.sector_count,
        });
    }

    Ok(info)
}

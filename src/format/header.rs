/// Disk info block parsing and track addressing

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::format::{detect_format, DiskImageFormat};
use log::debug;
use std::io::{Read, Seek, SeekFrom};

/// Track size table from the disk info block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSizes {
    /// Standard format: every track has this size in bytes
    Fixed(u16),
    /// Extended format: one entry per track, in 256-byte units
    PerTrack(Vec<u8>),
}

/// Parsed disk info block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    /// Container format, from the signature
    pub format: DiskImageFormat,
    /// Declared number of tracks
    pub num_tracks: u8,
    /// Declared number of sides (always 1 once parsed)
    pub num_sides: u8,
    /// Track size table
    pub track_sizes: TrackSizes,
}

impl ImageHeader {
    /// Read and validate the disk info block from the start of `stream`
    ///
    /// Reads are staged so that an unknown signature fails before anything
    /// past the first 8 bytes is touched, and an oversized extended table
    /// fails before the table itself is read.
    pub fn read<R: Read + Seek>(stream: &mut R) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let mut signature = [0u8; SIGNATURE_LEN];
        stream.read_exact(&mut signature)?;

        let format = detect_format(&signature).ok_or_else(|| {
            DskError::UnknownFormat(String::from_utf8_lossy(&signature).into_owned())
        })?;

        stream.seek(SeekFrom::Start(DISK_INFO_TRACK_COUNT_OFFSET as u64))?;
        let mut counts = [0u8; 2];
        stream.read_exact(&mut counts)?;
        let [num_tracks, num_sides] = counts;

        if num_sides != 1 {
            return Err(DskError::unsupported(format!(
                "{} sides (only single-sided disks are handled)",
                num_sides
            )));
        }

        let track_sizes = match format {
            DiskImageFormat::StandardDSK => {
                stream.seek(SeekFrom::Start(DISK_INFO_TRACK_SIZE_OFFSET as u64))?;
                let mut size = [0u8; 2];
                stream.read_exact(&mut size)?;
                TrackSizes::Fixed(u16::from_le_bytes(size))
            }
            DiskImageFormat::ExtendedDSK => {
                if num_tracks as usize >= EXT_TRACK_TABLE_CAPACITY {
                    return Err(DskError::TooLarge {
                        tracks: num_tracks as usize,
                        capacity: EXT_TRACK_TABLE_CAPACITY,
                    });
                }
                stream.seek(SeekFrom::Start(DISK_INFO_EXT_TRACK_SIZE_OFFSET as u64))?;
                let mut sizes = vec![0u8; num_tracks as usize];
                stream.read_exact(&mut sizes)?;
                TrackSizes::PerTrack(sizes)
            }
        };

        debug!(
            "{}: {} tracks, {} side(s), track sizes {:?}",
            format.name(),
            num_tracks,
            num_sides,
            track_sizes
        );

        Ok(Self {
            format,
            num_tracks,
            num_sides,
            track_sizes,
        })
    }

    /// Size in bytes of a track, including its track info block
    pub fn track_size(&self, track: u8) -> Result<usize> {
        self.check_track(track)?;
        Ok(match &self.track_sizes {
            TrackSizes::Fixed(size) => *size as usize,
            TrackSizes::PerTrack(sizes) => sizes[track as usize] as usize * TRACK_SIZE_UNIT,
        })
    }

    /// Byte offset of a track's information block within the image
    pub fn track_address(&self, track: u8) -> Result<u64> {
        self.check_track(track)?;
        let preceding = match &self.track_sizes {
            TrackSizes::Fixed(size) => track as u64 * *size as u64,
            TrackSizes::PerTrack(sizes) => sizes[..track as usize]
                .iter()
                .map(|&units| units as u64 * TRACK_SIZE_UNIT as u64)
                .sum(),
        };
        Ok(DISK_INFO_BLOCK_SIZE as u64 + preceding)
    }

    fn check_track(&self, track: u8) -> Result<()> {
        if track >= self.num_tracks {
            return Err(DskError::TooLarge {
                tracks: track as usize + 1,
                capacity: self.num_tracks as usize,
            });
        }
        Ok(())
    }
}

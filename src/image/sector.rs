/// Sector ID table decoding and sector addressing

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::format::DiskClass;
use crate::image::track::validate_track;
use log::trace;
use std::io::{Read, Seek, SeekFrom};

/// Sector ID (R) and size code (N) of one sector info entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorId {
    /// R - Sector ID as stored on disk
    pub sector: u8,
    /// N - Size code (2 = 512 bytes)
    pub size_code: u8,
}

impl SectorId {
    /// Create a new sector ID
    pub fn new(sector: u8, size_code: u8) -> Self {
        Self { sector, size_code }
    }
}

/// Mapping from logical sector number to physical slot within a track
///
/// Sectors are not necessarily stored in ID order; formatters often
/// interleave them. The slot is where the data sits after the track info
/// block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorTable {
    track: u8,
    first_sector_id: u8,
    slots: [Option<u8>; SECTORS_PER_TRACK as usize],
}

impl SectorTable {
    /// Build the table from sector IDs listed in physical order
    pub fn from_ids(track: u8, class: DiskClass, ids: &[SectorId]) -> Result<Self> {
        let mut slots = [None; SECTORS_PER_TRACK as usize];

        for (slot, id) in ids.iter().enumerate().take(SECTORS_PER_TRACK as usize) {
            let logical = class
                .logical_sector(id.sector)
                .ok_or(DskError::UnexpectedSectorId {
                    track,
                    id: id.sector,
                })?;

            if id.size_code != SECTOR_SIZE_CODE {
                return Err(DskError::UnexpectedSectorSize {
                    track,
                    code: id.size_code,
                });
            }

            slots[logical as usize] = Some(slot as u8);
        }

        Ok(Self {
            track,
            first_sector_id: class.first_sector_id(),
            slots,
        })
    }

    /// Read the sector info list of the track at `track_offset`
    ///
    /// The track info block is validated first.
    pub fn read<R: Read + Seek>(
        stream: &mut R,
        track_offset: u64,
        track: u8,
        class: DiskClass,
    ) -> Result<Self> {
        validate_track(stream, track_offset, track)?;

        stream.seek(SeekFrom::Start(
            track_offset + TRACK_INFO_SECTOR_LIST_OFFSET as u64,
        ))?;
        let mut list = [0u8; SECTORS_PER_TRACK as usize * SECTOR_INFO_SIZE];
        stream.read_exact(&mut list)?;

        let ids: Vec<SectorId> = list
            .chunks_exact(SECTOR_INFO_SIZE)
            .map(|info| SectorId::new(info[2], info[3]))
            .collect();

        Self::from_ids(track, class, &ids)
    }

    /// Physical slot holding a logical sector
    pub fn physical_slot(&self, logical_sector: u8) -> Result<u8> {
        self.slots
            .get(logical_sector as usize)
            .copied()
            .flatten()
            .ok_or(DskError::UnexpectedSectorId {
                track: self.track,
                id: self.first_sector_id.wrapping_add(logical_sector),
            })
    }

    /// Byte offset of a logical sector's data, given the track's offset
    pub fn sector_offset(&self, track_offset: u64, logical_sector: u8) -> Result<u64> {
        let slot = self.physical_slot(logical_sector)?;
        Ok(track_offset + TRACK_INFO_BLOCK_SIZE as u64 + slot as u64 * SECTOR_SIZE as u64)
    }
}

/// Resolve a logical sector of a track to its byte offset in the image
///
/// Re-validates the track info block and re-reads the sector table on every
/// call.
pub fn sector_address<R: Read + Seek>(
    stream: &mut R,
    track_offset: u64,
    track: u8,
    class: DiskClass,
    logical_sector: u8,
) -> Result<u64> {
    let table = SectorTable::read(stream, track_offset, track, class)?;
    let address = table.sector_offset(track_offset, logical_sector)?;
    trace!(
        "track {} sector {} at {:#07x}",
        track,
        logical_sector,
        address
    );
    Ok(address)
}

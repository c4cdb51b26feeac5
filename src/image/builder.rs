/// Builder for creating DSK images

use crate::error::{DskError, Result};
use crate::filesystem::cpm::{block_location, next_sector, DIR_ENTRY_SIZE, DIR_ENTRIES, ENTRIES_PER_SECTOR};
use crate::format::constants::*;
use crate::format::{DiskClass, DiskImageFormat};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Creator field written into the disk info block
const CREATOR_SIGNATURE: &[u8] = b"dskextract\0\0\0\0";

/// Offset of creator in disk info block
const DISK_INFO_CREATOR_OFFSET: usize = 0x22;

const DEFAULT_GAP3_LENGTH: u8 = 0x4E;
const DEFAULT_FILLER_BYTE: u8 = 0xE5;

/// Builder for formatted single-sided 9x512 DSK images held in memory
///
/// Sector contents default to the filler byte. Logical sectors are laid out
/// in the physical order given by [`interleave`](Self::interleave).
#[derive(Debug, Clone)]
pub struct DiskImageBuilder {
    format: DiskImageFormat,
    class: DiskClass,
    num_tracks: u8,
    interleave: Vec<u8>,
    track_interleave: HashMap<u8, Vec<u8>>,
    filler_byte: u8,
    padding: HashMap<u8, u8>,
    sectors: HashMap<(u8, u8), Vec<u8>>,
}

impl Default for DiskImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskImageBuilder {
    /// Create a new builder for a 40 track standard data disk
    pub fn new() -> Self {
        Self {
            format: DiskImageFormat::StandardDSK,
            class: DiskClass::Data,
            num_tracks: 40,
            interleave: (0..SECTORS_PER_TRACK).collect(),
            track_interleave: HashMap::new(),
            filler_byte: DEFAULT_FILLER_BYTE,
            padding: HashMap::new(),
            sectors: HashMap::new(),
        }
    }

    /// Set the DSK format
    pub fn format(mut self, format: DiskImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the disk class (sector numbering and reserved tracks)
    pub fn disk_class(mut self, class: DiskClass) -> Self {
        self.class = class;
        self
    }

    /// Set the number of tracks
    pub fn num_tracks(mut self, num_tracks: u8) -> Self {
        self.num_tracks = num_tracks;
        self
    }

    /// Set the physical order of logical sectors on every track
    pub fn interleave(mut self, order: &[u8]) -> Self {
        self.interleave = order.to_vec();
        self
    }

    /// Set the physical sector order of one track, overriding [`interleave`](Self::interleave)
    pub fn track_interleave(mut self, track: u8, order: &[u8]) -> Self {
        self.track_interleave.insert(track, order.to_vec());
        self
    }

    /// Set the filler byte for unwritten sectors
    pub fn filler_byte(mut self, filler_byte: u8) -> Self {
        self.filler_byte = filler_byte;
        self
    }

    /// Append unused 256-byte units to a track (extended format only)
    pub fn pad_track(mut self, track: u8, units: u8) -> Self {
        self.padding.insert(track, units);
        self
    }

    /// Store data for a logical sector, padded with the filler byte
    pub fn write_sector(&mut self, track: u8, logical_sector: u8, data: &[u8]) -> Result<()> {
        if track >= self.num_tracks {
            return Err(DskError::TooLarge {
                tracks: track as usize + 1,
                capacity: self.num_tracks as usize,
            });
        }
        if logical_sector >= SECTORS_PER_TRACK {
            return Err(DskError::UnexpectedSectorId {
                track,
                id: self.class.first_sector_id().wrapping_add(logical_sector),
            });
        }
        if data.len() > SECTOR_SIZE {
            return Err(DskError::unsupported(format!(
                "{} bytes do not fit a {} byte sector",
                data.len(),
                SECTOR_SIZE
            )));
        }

        let mut sector = data.to_vec();
        sector.resize(SECTOR_SIZE, self.filler_byte);
        self.sectors.insert((track, logical_sector), sector);
        Ok(())
    }

    /// Store data starting at an allocation block, spilling into following sectors
    pub fn write_block(&mut self, block: u8, data: &[u8]) -> Result<()> {
        let (mut track, mut sector) = block_location(self.class, block);
        for chunk in data.chunks(SECTOR_SIZE) {
            self.write_sector(track, sector, chunk)?;
            (track, sector) = next_sector(track, sector);
        }
        Ok(())
    }

    /// Store a raw 32-byte directory entry in slot `index` (0-63)
    pub fn write_dir_entry(&mut self, index: usize, entry: &[u8; DIR_ENTRY_SIZE]) -> Result<()> {
        if index >= DIR_ENTRIES {
            return Err(DskError::unsupported(format!("directory slot {}", index)));
        }

        let track = self.class.directory_track();
        let sector = (index / ENTRIES_PER_SECTOR) as u8;
        let offset = (index % ENTRIES_PER_SECTOR) * DIR_ENTRY_SIZE;

        let mut data = match self.sectors.get(&(track, sector)) {
            Some(existing) => existing.clone(),
            None => vec![self.filler_byte; SECTOR_SIZE],
        };
        data[offset..offset + DIR_ENTRY_SIZE].copy_from_slice(entry);
        self.write_sector(track, sector, &data)
    }

    /// Build the image bytes
    pub fn build(&self) -> Result<Vec<u8>> {
        let identity: Vec<u8> = (0..SECTORS_PER_TRACK).collect();
        for order in std::iter::once(&self.interleave).chain(self.track_interleave.values()) {
            let mut sorted = order.clone();
            sorted.sort_unstable();
            if sorted != identity {
                return Err(DskError::unsupported(format!(
                    "interleave {:?} is not a permutation of the sectors",
                    order
                )));
            }
        }

        let mut image = self.disk_info()?;
        for track in 0..self.num_tracks {
            image.extend(self.track_data(track));
        }
        Ok(image)
    }

    /// Build the image and write it to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = self.build()?;
        let mut file = File::create(path)?;
        file.write_all(&image)?;
        Ok(())
    }

    fn formatted_track_size(&self) -> usize {
        TRACK_INFO_BLOCK_SIZE + SECTORS_PER_TRACK as usize * SECTOR_SIZE
    }

    fn track_size(&self, track: u8) -> usize {
        let padding = match self.format {
            DiskImageFormat::ExtendedDSK => self.padding.get(&track).copied().unwrap_or(0),
            DiskImageFormat::StandardDSK => 0,
        };
        self.formatted_track_size() + padding as usize * TRACK_SIZE_UNIT
    }

    fn disk_info(&self) -> Result<Vec<u8>> {
        let mut disk_info = vec![0u8; DISK_INFO_BLOCK_SIZE];

        let signature = self.format.magic_bytes();
        disk_info[..signature.len()].copy_from_slice(signature);
        disk_info[DISK_INFO_CREATOR_OFFSET..DISK_INFO_CREATOR_OFFSET + CREATOR_SIGNATURE.len()]
            .copy_from_slice(CREATOR_SIGNATURE);

        disk_info[DISK_INFO_TRACK_COUNT_OFFSET] = self.num_tracks;
        disk_info[DISK_INFO_SIDE_COUNT_OFFSET] = 1;

        match self.format {
            DiskImageFormat::StandardDSK => {
                let size = (self.formatted_track_size() as u16).to_le_bytes();
                disk_info[DISK_INFO_TRACK_SIZE_OFFSET..DISK_INFO_TRACK_SIZE_OFFSET + 2]
                    .copy_from_slice(&size);
            }
            DiskImageFormat::ExtendedDSK => {
                if self.num_tracks as usize >= EXT_TRACK_TABLE_CAPACITY {
                    return Err(DskError::TooLarge {
                        tracks: self.num_tracks as usize,
                        capacity: EXT_TRACK_TABLE_CAPACITY,
                    });
                }
                for track in 0..self.num_tracks {
                    disk_info[DISK_INFO_EXT_TRACK_SIZE_OFFSET + track as usize] =
                        (self.track_size(track) / TRACK_SIZE_UNIT) as u8;
                }
            }
        }

        Ok(disk_info)
    }

    fn track_data(&self, track: u8) -> Vec<u8> {
        let mut track_data = vec![0u8; self.track_size(track)];

        track_data[..TRACK_INFO_MARKER.len()].copy_from_slice(TRACK_INFO_MARKER);
        track_data[0x10] = track;
        track_data[0x11] = 0;
        track_data[0x14] = SECTOR_SIZE_CODE;
        track_data[0x15] = SECTORS_PER_TRACK;
        track_data[0x16] = DEFAULT_GAP3_LENGTH;
        track_data[0x17] = self.filler_byte;

        let order = self.track_interleave.get(&track).unwrap_or(&self.interleave);
        for (slot, &logical) in order.iter().enumerate() {
            let sib_offset = TRACK_INFO_SECTOR_LIST_OFFSET + slot * SECTOR_INFO_SIZE;
            let sib = &mut track_data[sib_offset..sib_offset + SECTOR_INFO_SIZE];
            sib[0] = track;
            sib[1] = 0;
            sib[2] = self.class.first_sector_id() + logical;
            sib[3] = SECTOR_SIZE_CODE;
            sib[6..8].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());

            let data_offset = TRACK_INFO_BLOCK_SIZE + slot * SECTOR_SIZE;
            let data = &mut track_data[data_offset..data_offset + SECTOR_SIZE];
            match self.sectors.get(&(track, logical)) {
                Some(sector) => data.copy_from_slice(sector),
                None => data.fill(self.filler_byte),
            }
        }

        track_data
    }
}

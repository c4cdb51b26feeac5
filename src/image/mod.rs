/// DSK image access

/// Image builder for creating DSK images
pub mod builder;
/// Sector ID table and sector addressing
pub mod sector;
/// Track information block validation
pub mod track;

pub use builder::DiskImageBuilder;
pub use sector::{sector_address, SectorId, SectorTable};
pub use track::{validate_track, TrackInfo};

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::format::{DiskClass, DiskImageFormat, ImageHeader};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// An open DSK image
///
/// Only the disk info block is parsed up front. Tracks and sectors are read
/// from the underlying stream on demand, and every sector lookup re-validates
/// the owning track.
#[derive(Debug)]
pub struct DiskImage<R> {
    stream: R,
    header: ImageHeader,
    class: DiskClass,
}

impl DiskImage<BufReader<File>> {
    /// Open a DSK file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> DiskImage<R> {
    /// Parse the header and determine the disk class
    pub fn from_reader(mut stream: R) -> Result<Self> {
        let header = ImageHeader::read(&mut stream)?;

        stream.seek(SeekFrom::Start(FIRST_SECTOR_ID_OFFSET))?;
        let mut first_id = [0u8; 1];
        stream.read_exact(&mut first_id)?;

        let class = DiskClass::from_sector_id(first_id[0]).ok_or_else(|| {
            DskError::unsupported(format!("first sector ID {:#04x}", first_id[0]))
        })?;
        debug!("{} disk, directory on track {}", class.name(), class.directory_track());

        Ok(Self {
            stream,
            header,
            class,
        })
    }

    /// Get the parsed disk info block
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Get the format type
    pub fn format(&self) -> DiskImageFormat {
        self.header.format
    }

    /// Get the disk class
    pub fn disk_class(&self) -> DiskClass {
        self.class
    }

    /// Byte offset of a track within the image
    pub fn track_address(&self, track: u8) -> Result<u64> {
        self.header.track_address(track)
    }

    /// Validate a track's information block
    pub fn validate_track(&mut self, track: u8) -> Result<TrackInfo> {
        let offset = self.header.track_address(track)?;
        validate_track(&mut self.stream, offset, track)
    }

    /// Byte offset of a logical sector (0-8) of a track
    pub fn sector_address(&mut self, track: u8, logical_sector: u8) -> Result<u64> {
        let offset = self.header.track_address(track)?;
        sector_address(&mut self.stream, offset, track, self.class, logical_sector)
    }

    /// Read a logical sector (0-8) of a track
    pub fn read_sector(&mut self, track: u8, logical_sector: u8) -> Result<[u8; SECTOR_SIZE]> {
        let address = self.sector_address(track, logical_sector)?;
        self.stream.seek(SeekFrom::Start(address))?;
        let mut data = [0u8; SECTOR_SIZE];
        self.stream.read_exact(&mut data)?;
        Ok(data)
    }

    pub(crate) fn stream_mut(&mut self) -> &mut R {
        &mut self.stream
    }

    /// Release the underlying stream
    pub fn into_inner(self) -> R {
        self.stream
    }
}

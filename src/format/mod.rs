/// DSK format detection, constants and header parsing

/// Format constants
pub mod constants;
/// Disk info block and track geometry
pub mod header;

pub use constants::*;
pub use header::{ImageHeader, TrackSizes};

/// DSK format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskImageFormat {
    /// Standard DSK format with fixed track sizes
    StandardDSK,
    /// Extended DSK format with variable track sizes
    ExtendedDSK,
}

impl DiskImageFormat {
    /// Get the magic bytes for this format
    pub fn magic_bytes(&self) -> &'static [u8] {
        match self {
            DiskImageFormat::StandardDSK => STANDARD_DSK_SIGNATURE,
            DiskImageFormat::ExtendedDSK => EXTENDED_DSK_SIGNATURE,
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            DiskImageFormat::StandardDSK => "Standard DSK",
            DiskImageFormat::ExtendedDSK => "Extended DSK",
        }
    }
}

/// Detect DSK format from magic bytes
pub fn detect_format(magic: &[u8]) -> Option<DiskImageFormat> {
    if magic.len() < SIGNATURE_LEN {
        return None;
    }

    if magic.starts_with(&EXTENDED_DSK_SIGNATURE[..SIGNATURE_LEN]) {
        Some(DiskImageFormat::ExtendedDSK)
    } else if magic.starts_with(&STANDARD_DSK_SIGNATURE[..SIGNATURE_LEN]) {
        Some(DiskImageFormat::StandardDSK)
    } else {
        None
    }
}

/// Amstrad disk class, told apart by the sector ID numbering
///
/// System disks number their sectors from 0x41 and reserve two tracks for
/// the boot loader, so the directory sits on track 2. Data disks number
/// from 0xC1 and keep the directory on track 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskClass {
    /// System format (IDs 0x41-0x49)
    System,
    /// Data format (IDs 0xC1-0xC9)
    Data,
}

impl DiskClass {
    /// Identify the class from the first sector ID of track 0
    ///
    /// Only the base IDs 0x41 and 0xC1 are recognized.
    pub fn from_sector_id(id: u8) -> Option<Self> {
        [DiskClass::System, DiskClass::Data]
            .into_iter()
            .find(|class| class.first_sector_id() == id)
    }

    /// Sector ID of logical sector 0
    pub fn first_sector_id(&self) -> u8 {
        match self {
            DiskClass::System => SYSTEM_FIRST_SECTOR_ID,
            DiskClass::Data => DATA_FIRST_SECTOR_ID,
        }
    }

    /// Tracks reserved before the directory
    pub fn reserved_tracks(&self) -> u8 {
        match self {
            DiskClass::System => SYSTEM_RESERVED_TRACKS,
            DiskClass::Data => 0,
        }
    }

    /// Track holding the 64-entry directory
    pub fn directory_track(&self) -> u8 {
        self.reserved_tracks()
    }

    /// Map a raw sector ID to a logical sector number, if it belongs to this class
    pub fn logical_sector(&self, id: u8) -> Option<u8> {
        let logical = id.wrapping_sub(self.first_sector_id());
        (logical < SECTORS_PER_TRACK).then_some(logical)
    }

    /// Get a human-readable name for this class
    pub fn name(&self) -> &'static str {
        match self {
            DiskClass::System => "System",
            DiskClass::Data => "Data",
        }
    }
}

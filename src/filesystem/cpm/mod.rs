/// CP/M filesystem structures for Amstrad CPC disks
///
/// The disk parameters are fixed: 1024-byte blocks of two sectors, 64
/// directory entries on a single track, 8-bit block numbers.

/// Extent data extraction
pub mod blocks;
/// Directory walking
pub mod directory;

pub use blocks::ExtentData;
pub use directory::{CatalogEntry, Directory};

use crate::format::constants::{SECTORS_PER_TRACK, SECTOR_SIZE};
use crate::format::DiskClass;
use std::fmt;

/// Unit of data transfer in bytes as seen by the CP/M BDOS
pub const RECORD_SIZE: usize = 128;
/// Records held by one 512-byte sector
pub const RECORDS_PER_SECTOR: usize = SECTOR_SIZE / RECORD_SIZE;
/// Sectors per allocation block
pub const SECTORS_PER_BLOCK: usize = 2;
/// Allocation block size in bytes
pub const BLOCK_SIZE: usize = SECTOR_SIZE * SECTORS_PER_BLOCK;
/// Records held by one allocation block
pub const RECORDS_PER_BLOCK: usize = BLOCK_SIZE / RECORD_SIZE;
/// Block numbers in one directory entry
pub const BLOCKS_PER_EXTENT: usize = 16;
/// Size of the directory entry in bytes, always 32
pub const DIR_ENTRY_SIZE: usize = 32;
/// Number of directory entries
pub const DIR_ENTRIES: usize = 64;
/// Directory entries per sector
pub const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;
/// Status byte for a deleted file
pub const DELETED: u8 = 0xE5;
/// Bytes of name plus extension
pub const NAME_FIELD_LEN: usize = 11;

const NAME_LEN: usize = 8;

/// Track and logical sector where an allocation block starts
///
/// Blocks are numbered from the first directory sector, so system disks
/// shift every block past their reserved tracks.
pub fn block_location(class: DiskClass, block: u8) -> (u8, u8) {
    let first_sector = block as usize * SECTORS_PER_BLOCK;
    let track = (first_sector / SECTORS_PER_TRACK as usize) as u8;
    let sector = (first_sector % SECTORS_PER_TRACK as usize) as u8;
    (track + class.reserved_tracks(), sector)
}

/// The logical sector following `(track, sector)`, wrapping onto the next track
pub fn next_sector(track: u8, sector: u8) -> (u8, u8) {
    if sector + 1 == SECTORS_PER_TRACK {
        (track + 1, 0)
    } else {
        (track, sector + 1)
    }
}

/// Attribute bits carried in the high bits of the 11 name bytes
///
/// Bit 10 comes from the first filename byte, bit 0 from the last extension
/// byte. The extension bits are the CP/M read-only (T1), system (T2) and
/// archive (T3) flags; the first four filename bits are the user flags F1-F4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Attributes(pub u16);

impl Attributes {
    /// Raw attribute word
    pub fn bits(&self) -> u16 {
        self.0
    }

    /// Whether the high bit of name byte `index` (0-10) was set
    pub fn is_set(&self, index: usize) -> bool {
        index < NAME_FIELD_LEN && self.0 & (1 << (NAME_FIELD_LEN - 1 - index)) != 0
    }

    /// T1' - file is read-only
    pub fn read_only(&self) -> bool {
        self.is_set(NAME_LEN)
    }

    /// T2' - file is a system file
    pub fn system(&self) -> bool {
        self.is_set(NAME_LEN + 1)
    }

    /// T3' - file has been archived
    pub fn archive(&self) -> bool {
        self.is_set(NAME_LEN + 2)
    }

    /// F1'-F4' user flags, `flag` in 1..=4
    pub fn user_flag(&self, flag: usize) -> bool {
        (1..=4).contains(&flag) && self.is_set(flag - 1)
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read_only(), 'R'),
            flag(self.system(), 'S'),
            flag(self.archive(), 'A')
        )
    }
}

/// Separate the attribute bits from the 11 name bytes
pub fn strip_attributes(raw: &[u8; NAME_FIELD_LEN]) -> ([u8; NAME_FIELD_LEN], Attributes) {
    let mut clean = [0u8; NAME_FIELD_LEN];
    let mut bits = 0u16;

    for (i, &byte) in raw.iter().enumerate() {
        bits |= ((byte >> 7) as u16) << (NAME_FIELD_LEN - 1 - i);
        clean[i] = byte & 0x7F;
    }

    (clean, Attributes(bits))
}

/// Put attribute bits back into cleaned name bytes
pub fn apply_attributes(clean: &[u8; NAME_FIELD_LEN], attributes: Attributes) -> [u8; NAME_FIELD_LEN] {
    let mut raw = *clean;
    for (i, byte) in raw.iter_mut().enumerate() {
        if attributes.is_set(i) {
            *byte |= 0x80;
        }
    }
    raw
}

fn trimmed(bytes: &[u8]) -> &[u8] {
    let len = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |last| last + 1);
    &bytes[..len]
}

/// Decode the 11 name bytes into `NAME.EXT` and the attribute word
///
/// Returns an empty name when the filename part is blank; callers treat
/// such entries as unused.
pub fn decode_name(raw: &[u8; NAME_FIELD_LEN]) -> (String, Attributes) {
    let (clean, attributes) = strip_attributes(raw);

    let name = trimmed(&clean[..NAME_LEN]);
    if name.is_empty() {
        return (String::new(), attributes);
    }
    let extension = trimmed(&clean[NAME_LEN..]);

    let mut filename: String = name.iter().map(|&b| char::from(b)).collect();
    if !extension.is_empty() {
        filename.push('.');
        filename.extend(extension.iter().map(|&b| char::from(b)));
    }

    (filename, attributes)
}

/// Decoded 32-byte directory entry of a live file extent
///
/// Only user 0 entries are decoded into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Slot in the directory (0-63)
    pub index: usize,
    /// `NAME.EXT` with attribute bits removed
    pub name: String,
    /// Attribute bits from the name bytes
    pub attributes: Attributes,
    /// Extent number
    pub extent: u16,
    /// 128-byte records used in this extent
    pub record_count: u8,
    /// Allocation blocks, 0 marks the end
    pub blocks: [u8; BLOCKS_PER_EXTENT],
}

impl DirEntry {
    /// Allocated blocks up to the first unused (zero) slot
    pub fn block_list(&self) -> impl Iterator<Item = u8> + '_ {
        self.blocks.iter().copied().take_while(|&block| block != 0)
    }

    /// Number of bytes this extent contributes to the file
    pub fn data_size(&self) -> usize {
        let listed = self.block_list().count() * RECORDS_PER_BLOCK;
        (self.record_count as usize).min(listed) * RECORD_SIZE
    }
}

/// One directory slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirSlot {
    /// Deleted or belonging to another user
    Deleted {
        /// Slot in the directory
        index: usize,
        /// User byte (0xE5 when deleted)
        user: u8,
    },
    /// User 0 but the filename is blank
    Blank {
        /// Slot in the directory
        index: usize,
    },
    /// A live file extent
    File(DirEntry),
}

impl DirSlot {
    /// Decode a raw directory entry
    pub fn parse(index: usize, raw: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let user = raw[0];
        if user != 0 {
            return DirSlot::Deleted { index, user };
        }

        let mut name_field = [0u8; NAME_FIELD_LEN];
        name_field.copy_from_slice(&raw[1..12]);
        let (name, attributes) = decode_name(&name_field);
        if name.is_empty() {
            return DirSlot::Blank { index };
        }

        // EX holds the low 5 bits, S2 the bits above them
        let extent = ((raw[14] as u16) << 5) | (raw[12] & 0x1F) as u16;
        let record_count = raw[15];

        let mut blocks = [0u8; BLOCKS_PER_EXTENT];
        blocks.copy_from_slice(&raw[16..32]);

        DirSlot::File(DirEntry {
            index,
            name,
            attributes,
            extent,
            record_count,
            blocks,
        })
    }

    /// The live entry, if any
    pub fn entry(&self) -> Option<&DirEntry> {
        match self {
            DirSlot::File(entry) => Some(entry),
            _ => None,
        }
    }
}

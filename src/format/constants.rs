/// DSK format magic bytes and geometry constants

/// Standard DSK signature (only the first 8 bytes are significant)
pub const STANDARD_DSK_SIGNATURE: &[u8] = b"MV - CPCEMU Disk-File\r\nDisk-Info\r\n";

/// Extended DSK signature (only the first 8 bytes are significant)
pub const EXTENDED_DSK_SIGNATURE: &[u8] = b"EXTENDED CPC DSK File\r\nDisk-Info\r\n";

/// Number of signature bytes compared when detecting the format
pub const SIGNATURE_LEN: usize = 8;

/// Track-Info block marker
pub const TRACK_INFO_MARKER: &[u8; 12] = b"Track-Info\r\n";

/// Size of disk info block
pub const DISK_INFO_BLOCK_SIZE: usize = 0x100;

/// Size of track info block; sector data follows it
pub const TRACK_INFO_BLOCK_SIZE: usize = 0x100;

/// Size of sector info entry
pub const SECTOR_INFO_SIZE: usize = 8;

/// Offset of the first sector info entry in the track info block
pub const TRACK_INFO_SECTOR_LIST_OFFSET: usize = 0x18;

/// Offset of the first sector ID (R) byte in the track info block
pub const TRACK_INFO_SECTOR_ID_OFFSET: usize = TRACK_INFO_SECTOR_LIST_OFFSET + 2;

/// Offset of track count in disk info block
pub const DISK_INFO_TRACK_COUNT_OFFSET: usize = 0x30;

/// Offset of side count in disk info block
pub const DISK_INFO_SIDE_COUNT_OFFSET: usize = 0x31;

/// Offset of track size in disk info block (standard format)
pub const DISK_INFO_TRACK_SIZE_OFFSET: usize = 0x32;

/// Offset of extended track size table in disk info block (extended format)
pub const DISK_INFO_EXT_TRACK_SIZE_OFFSET: usize = 0x34;

/// Number of entries the extended track size table can hold
pub const EXT_TRACK_TABLE_CAPACITY: usize = DISK_INFO_BLOCK_SIZE - DISK_INFO_EXT_TRACK_SIZE_OFFSET;

/// Extended track sizes are stored in units of this many bytes
pub const TRACK_SIZE_UNIT: usize = 256;

/// Absolute offset of the first sector ID on track 0, used to tell disk classes apart
pub const FIRST_SECTOR_ID_OFFSET: u64 = (DISK_INFO_BLOCK_SIZE + TRACK_INFO_SECTOR_ID_OFFSET) as u64;

/// Only supported sector size
pub const SECTOR_SIZE: usize = 512;

/// FDC size code for 512-byte sectors
pub const SECTOR_SIZE_CODE: u8 = 2;

/// Only supported sector count per track
pub const SECTORS_PER_TRACK: u8 = 9;

/// Base sector ID of the Amstrad system format
pub const SYSTEM_FIRST_SECTOR_ID: u8 = 0x41;

/// Base sector ID of the Amstrad data format
pub const DATA_FIRST_SECTOR_ID: u8 = 0xC1;

/// Tracks reserved ahead of the directory on system disks
pub const SYSTEM_RESERVED_TRACKS: u8 = 2;

/// Convert FDC size code to actual byte size
#[inline]
pub fn fdc_size_to_bytes(size_code: u8) -> usize {
    128usize << (size_code.min(8) as usize)
}

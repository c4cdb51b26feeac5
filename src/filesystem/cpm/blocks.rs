/// Extent data extraction

use crate::error::Result;
use crate::filesystem::cpm::{
    block_location, next_sector, DirEntry, BLOCKS_PER_EXTENT, RECORDS_PER_SECTOR, RECORD_SIZE,
    SECTORS_PER_BLOCK,
};
use crate::format::constants::SECTOR_SIZE;
use crate::image::DiskImage;
use log::trace;
use std::io::{Read, Seek, Write};

/// Sector-sized chunks of one extent's data, trimmed to its record count
///
/// Walks the block list until a zero block or until the records run out.
/// Each block covers two consecutive logical sectors; the final chunk may
/// be shorter than a sector.
pub struct ExtentData<'a, R> {
    image: &'a mut DiskImage<R>,
    blocks: [u8; BLOCKS_PER_EXTENT],
    block_index: usize,
    sector_in_block: usize,
    position: (u8, u8),
    records: usize,
    done: bool,
}

impl<R: Read + Seek> Iterator for ExtentData<'_, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.records == 0 {
            return None;
        }

        if self.sector_in_block == 0 {
            let block = match self.blocks.get(self.block_index) {
                Some(&block) if block != 0 => block,
                _ => {
                    self.done = true;
                    return None;
                }
            };
            self.position = block_location(self.image.disk_class(), block);
            trace!(
                "block {:#04x} starts at track {}, sector {}",
                block,
                self.position.0,
                self.position.1
            );
        }

        let (track, sector) = self.position;
        let data = match self.image.read_sector(track, sector) {
            Ok(data) => data,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let len = SECTOR_SIZE.min(self.records * RECORD_SIZE);
        self.records = self.records.saturating_sub(RECORDS_PER_SECTOR);
        self.position = next_sector(track, sector);
        self.sector_in_block += 1;
        if self.sector_in_block == SECTORS_PER_BLOCK {
            self.sector_in_block = 0;
            self.block_index += 1;
        }

        Some(Ok(data[..len].to_vec()))
    }
}

impl<R: Read + Seek> DiskImage<R> {
    /// Iterate over the data of one directory entry
    pub fn extent_data(&mut self, entry: &DirEntry) -> ExtentData<'_, R> {
        ExtentData {
            image: self,
            blocks: entry.blocks,
            block_index: 0,
            sector_in_block: 0,
            position: (0, 0),
            records: entry.record_count as usize,
            done: false,
        }
    }

    /// Write the data of one directory entry to `out`, returning the byte count
    pub fn copy_extent<W: Write + ?Sized>(&mut self, entry: &DirEntry, out: &mut W) -> Result<u64> {
        let mut written = 0u64;
        for chunk in self.extent_data(entry) {
            let chunk = chunk?;
            out.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }

    /// Read a whole file into memory by appending its extents in directory order
    ///
    /// Returns `None` when no user 0 entry has this name.
    pub fn read_file(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let extents: Vec<DirEntry> = self
            .entries()?
            .into_iter()
            .filter(|entry| entry.name.eq_ignore_ascii_case(name))
            .collect();

        if extents.is_empty() {
            return Ok(None);
        }

        let mut data = Vec::new();
        for extent in &extents {
            self.copy_extent(extent, &mut data)?;
        }
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DskError;
    use crate::filesystem::cpm::{Attributes, BLOCK_SIZE};
    use crate::format::DiskClass;
    use crate::image::DiskImageBuilder;
    use std::io::Cursor;

    fn dir_entry(records: u8, blocks: &[u8]) -> DirEntry {
        let mut list = [0u8; BLOCKS_PER_EXTENT];
        list[..blocks.len()].copy_from_slice(blocks);
        DirEntry {
            index: 0,
            name: "TEST.BIN".to_string(),
            attributes: Attributes::default(),
            extent: 0,
            record_count: records,
            blocks: list,
        }
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn data_image(blocks: &[(u8, Vec<u8>)]) -> DiskImage<Cursor<Vec<u8>>> {
        let mut builder = DiskImageBuilder::new()
            .num_tracks(6)
            .interleave(&[0, 5, 1, 6, 2, 7, 3, 8, 4]);
        for (block, data) in blocks {
            builder.write_block(*block, data).unwrap();
        }
        DiskImage::from_reader(Cursor::new(builder.build().unwrap())).unwrap()
    }

    #[test]
    fn test_partial_last_sector() {
        let content = patterned(BLOCK_SIZE);
        let mut image = data_image(&[(2, content.clone())]);

        let chunks: Vec<Vec<u8>> = image
            .extent_data(&dir_entry(5, &[2]))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], content[..512]);
        assert_eq!(chunks[1], content[512..640]);
    }

    #[test]
    fn test_block_crossing_track() {
        // Block 4 covers track 0 sector 8 and track 1 sector 0
        let content = patterned(BLOCK_SIZE);
        let mut image = data_image(&[(4, content.clone())]);

        let mut out = Vec::new();
        let written = image.copy_extent(&dir_entry(8, &[4]), &mut out).unwrap();
        assert_eq!(written, 1024);
        assert_eq!(out, content);
    }

    #[test]
    fn test_zero_block_stops() {
        let mut image = data_image(&[(2, patterned(BLOCK_SIZE)), (3, vec![0x33; BLOCK_SIZE])]);

        let mut out = Vec::new();
        let written = image
            .copy_extent(&dir_entry(16, &[2, 0, 3]), &mut out)
            .unwrap();
        assert_eq!(written, BLOCK_SIZE as u64);
    }

    #[test]
    fn test_zero_records_reads_nothing() {
        let mut image = data_image(&[]);
        assert!(image.extent_data(&dir_entry(0, &[2])).next().is_none());
    }

    #[test]
    fn test_system_disk_offset() {
        let content = patterned(BLOCK_SIZE);
        let mut builder = DiskImageBuilder::new()
            .disk_class(DiskClass::System)
            .num_tracks(4);
        builder.write_block(2, &content).unwrap();
        let bytes = builder.build().unwrap();
        let mut image = DiskImage::from_reader(Cursor::new(bytes)).unwrap();

        // Block 2 of a system disk starts at track 2 sector 4
        assert_eq!(image.read_sector(2, 4).unwrap()[..], content[..512]);

        let mut out = Vec::new();
        image.copy_extent(&dir_entry(8, &[2]), &mut out).unwrap();
        assert_eq!(out, content);
    }

    #[test]
    fn test_block_past_last_track() {
        let mut image = data_image(&[]);
        let result = image.copy_extent(&dir_entry(8, &[200]), &mut Vec::new());
        assert!(matches!(result, Err(DskError::TooLarge { .. })));
    }
}

/// Directory walking

use crate::error::Result;
use crate::filesystem::cpm::{Attributes, DirEntry, DirSlot, DIR_ENTRIES, DIR_ENTRY_SIZE, ENTRIES_PER_SECTOR};
use crate::image::DiskImage;
use log::debug;
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

/// Lazy walk over the 64 directory slots
///
/// Yields one item per slot. After an error the walk ends.
pub struct Directory<'a, R> {
    image: &'a mut DiskImage<R>,
    index: usize,
    failed: bool,
}

impl<R: Read + Seek> Iterator for Directory<'_, R> {
    type Item = Result<DirSlot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= DIR_ENTRIES {
            return None;
        }

        let result = self.image.dir_slot(self.index);
        self.index += 1;
        self.failed = result.is_err();
        Some(result)
    }
}

/// A file as listed in the catalog, merged over all its extents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Filename (8.3 format, e.g., "FILENAME.TXT")
    pub name: String,
    /// Attributes of the first extent
    pub attributes: Attributes,
    /// Number of directory entries
    pub extents: usize,
    /// Total 128-byte records
    pub records: usize,
    /// Allocation blocks in use
    pub blocks: usize,
    /// File size in bytes
    pub size: usize,
}

impl<R: Read + Seek> DiskImage<R> {
    /// Read and decode directory slot `index` (0-63)
    pub fn dir_slot(&mut self, index: usize) -> Result<DirSlot> {
        let track = self.disk_class().directory_track();
        let sector = (index / ENTRIES_PER_SECTOR) as u8;
        let address = self.sector_address(track, sector)?
            + ((index % ENTRIES_PER_SECTOR) * DIR_ENTRY_SIZE) as u64;

        let stream = self.stream_mut();
        stream.seek(SeekFrom::Start(address))?;
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        stream.read_exact(&mut raw)?;

        let slot = DirSlot::parse(index, &raw);
        if let DirSlot::File(entry) = &slot {
            debug!(
                "entry {}: {} attributes {:#05x} extent {} records {}",
                index,
                entry.name,
                entry.attributes.bits(),
                entry.extent,
                entry.record_count
            );
        }
        Ok(slot)
    }

    /// Walk the directory
    pub fn directory(&mut self) -> Directory<'_, R> {
        Directory {
            image: self,
            index: 0,
            failed: false,
        }
    }

    /// Live user 0 entries in directory order
    pub fn entries(&mut self) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for slot in self.directory() {
            if let DirSlot::File(entry) = slot? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// List files, merging extents, sorted by filename
    pub fn catalog(&mut self) -> Result<Vec<CatalogEntry>> {
        let mut files: Vec<CatalogEntry> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for entry in self.entries()? {
            let index = *by_name.entry(entry.name.clone()).or_insert_with(|| {
                files.push(CatalogEntry {
                    name: entry.name.clone(),
                    attributes: entry.attributes,
                    extents: 0,
                    records: 0,
                    blocks: 0,
                    size: 0,
                });
                files.len() - 1
            });

            let file = &mut files[index];
            file.extents += 1;
            file.records += entry.record_count as usize;
            file.blocks += entry.block_list().count();
            file.size += entry.data_size();
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

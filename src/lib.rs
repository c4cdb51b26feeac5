/*!
# dskextract

A Rust library for extracting the CP/M files stored on Amstrad CPC DSK disk images.

## Features

- Read Standard and Extended DSK containers
- Sector lookup through each track's sector ID table (interleaved tracks work)
- CP/M directory decoding, including the attribute bits hidden in filenames
- Byte-exact file reconstruction from blocks, extents and record counts
- Idiomatic Rust API with comprehensive error handling

Only single-sided disks with nine 512-byte sectors per track are handled,
in the Amstrad system (sector IDs 0x41-0x49) or data (0xC1-0xC9) formats.

## Quick Start

```rust,no_run
use dskextract::{extract_image, DiskImage};

// List the files on a disk
let mut image = DiskImage::open("disk.dsk")?;
for file in image.catalog()? {
    println!("{}: {} bytes", file.name, file.size);
}

// Read one file
let contents = image.read_file("README.TXT")?;

// Extract everything into a directory
let report = extract_image("disk.dsk", "out")?;
println!("{} files extracted", report.files.len());
# Ok::<(), dskextract::DskError>(())
```

## Modules

- `format`: DSK signatures, constants and the disk info block
- `image`: Track validation, sector lookup and the image builder
- `filesystem`: CP/M directory, extent data and extraction
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Error types and Result alias
pub mod error;
/// CP/M filesystem and extraction
pub mod filesystem;
/// DSK format detection, constants and header parsing
pub mod format;
/// Image access (DiskImage, tracks, sectors)
pub mod image;

// Re-export common types
pub use error::{DskError, Result};
pub use filesystem::{
    extract_image, extract_to_sink, Attributes, CatalogEntry, DirEntry, DirSlot, DirectorySink,
    ExtractReport, ExtractedFile, MemorySink, OpenMode, OutputSink,
};
pub use format::{DiskClass, DiskImageFormat, ImageHeader, TrackSizes};
pub use image::{DiskImage, DiskImageBuilder, SectorId, SectorTable, TrackInfo};

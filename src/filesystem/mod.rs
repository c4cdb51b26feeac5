/// Filesystem implementations

/// CP/M directory and extent decoding
pub mod cpm;
/// Writing files out of an image
pub mod extract;

pub use cpm::{
    block_location, decode_name, next_sector, Attributes, CatalogEntry, DirEntry, DirSlot,
    Directory, ExtentData,
};
pub use extract::{
    extract_image, extract_to_sink, host_file_name, DirectorySink, ExtractReport, ExtractedFile,
    MemorySink, OpenMode, OutputSink,
};

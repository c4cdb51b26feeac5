/// Extraction of every file on a disk

use crate::error::Result;
use crate::filesystem::cpm::{DirSlot, DIR_ENTRIES};
use crate::image::DiskImage;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// How an output file is opened for an extent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create or empty the file (first extent of a file)
    Truncate,
    /// Add to the end of the file (later extents)
    Append,
}

/// Destination for extracted files
pub trait OutputSink {
    /// Open a writer for `name`
    ///
    /// The writer is flushed and dropped before the next file is opened.
    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Box<dyn Write + '_>>;
}

/// Writes extracted files into a host directory
///
/// Each CP/M name is given its own host file for the lifetime of the sink.
/// When two names clean up to the same host name the later one gets a `~N`
/// suffix.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
    host_names: HashMap<String, String>,
    claimed: HashSet<String>,
}

impl DirectorySink {
    /// Create a sink writing into `root`, which must exist
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            host_names: HashMap::new(),
            claimed: HashSet::new(),
        }
    }

    /// Host path for a CP/M filename, reserving a host name on first use
    pub fn path_for(&mut self, name: &str) -> PathBuf {
        if let Some(host) = self.host_names.get(name) {
            return self.root.join(host);
        }

        let cleaned = host_file_name(name);
        let mut host = cleaned.clone();
        let mut suffix = 1;
        // Host filesystems may ignore case
        while self.claimed.contains(&host.to_ascii_lowercase()) {
            host = format!("{}~{}", cleaned, suffix);
            suffix += 1;
        }
        if host != name {
            warn!("{:?} written as {:?}", name, host);
        }

        self.claimed.insert(host.to_ascii_lowercase());
        self.host_names.insert(name.to_string(), host.clone());
        self.root.join(host)
    }
}

impl OutputSink for DirectorySink {
    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Box<dyn Write + '_>> {
        let path = self.path_for(name);
        let file: File = match mode {
            OpenMode::Truncate => File::create(&path)?,
            OpenMode::Append => OpenOptions::new().create(true).append(true).open(&path)?,
        };
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Keeps extracted files in memory, keyed by CP/M filename
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a file's contents
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|data| data.as_slice())
    }

    /// All files, sorted by name
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    /// Take ownership of the files
    pub fn into_files(self) -> BTreeMap<String, Vec<u8>> {
        self.files
    }
}

impl OutputSink for MemorySink {
    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Box<dyn Write + '_>> {
        let data = self.files.entry(name.to_string()).or_default();
        if mode == OpenMode::Truncate {
            data.clear();
        }
        Ok(Box::new(data))
    }
}

/// Replace characters that cannot appear in a single host path component
///
/// CP/M names are 7-bit and may contain path separators; `.` and `..`
/// would leave the destination directory.
pub fn host_file_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_ascii_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        cleaned = "_".repeat(cleaned.len());
    }
    cleaned
}

/// One extracted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// CP/M filename
    pub name: String,
    /// Directory entries written
    pub extents: usize,
    /// Bytes written
    pub size: u64,
}

/// Outcome of a complete extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Files in order of first appearance in the directory
    pub files: Vec<ExtractedFile>,
    /// Directory slots that were deleted, foreign-user or blank
    pub skipped: usize,
}

/// Extract every user 0 file of a DSK image into `output_dir`
///
/// Stops at the first error. The image is closed on every path.
pub fn extract_image<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, output_dir: Q) -> Result<ExtractReport> {
    let mut image = DiskImage::open(image_path)?;
    let mut sink = DirectorySink::new(output_dir.as_ref());
    extract_to_sink(&mut image, &mut sink)
}

/// Extract every user 0 file of an open image into `sink`
///
/// Extents are appended in directory order, whatever their extent numbers.
/// A file's output is truncated on the first entry seen for that name in this
/// pass, so repeated extraction gives identical output.
pub fn extract_to_sink<R, S>(image: &mut DiskImage<R>, sink: &mut S) -> Result<ExtractReport>
where
    R: Read + Seek,
    S: OutputSink + ?Sized,
{
    let mut report = ExtractReport::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for index in 0..DIR_ENTRIES {
        let entry = match image.dir_slot(index)? {
            DirSlot::File(entry) => entry,
            DirSlot::Deleted { .. } | DirSlot::Blank { .. } => {
                report.skipped += 1;
                continue;
            }
        };

        let known = seen.get(&entry.name).copied();
        let mode = match known {
            Some(_) => OpenMode::Append,
            None => OpenMode::Truncate,
        };

        let mut writer = sink.open(&entry.name, mode)?;
        let copied = image.copy_extent(&entry, &mut writer);
        let flushed = writer.flush();
        drop(writer);
        let size = copied?;
        flushed?;

        let file = match known {
            Some(position) => &mut report.files[position],
            None => {
                seen.insert(entry.name.clone(), report.files.len());
                report.files.push(ExtractedFile {
                    name: entry.name.clone(),
                    extents: 0,
                    size: 0,
                });
                let last = report.files.len() - 1;
                &mut report.files[last]
            }
        };
        file.extents += 1;
        file.size += size;

        info!(
            "{} extent {}: {} bytes ({})",
            entry.name, entry.extent, size, entry.attributes
        );
    }

    Ok(report)
}

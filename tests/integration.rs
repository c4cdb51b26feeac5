/// Integration tests for dskextract

use dskextract::*;
use std::io::Cursor;

fn dir_entry(user: u8, name: &[u8; 11], extent: u16, records: u8, blocks: &[u8]) -> [u8; 32] {
    let mut raw = [0u8; 32];
    raw[0] = user;
    raw[1..12].copy_from_slice(name);
    raw[12] = (extent & 0x1F) as u8;
    raw[14] = (extent >> 5) as u8;
    raw[15] = records;
    raw[16..16 + blocks.len()].copy_from_slice(blocks);
    raw
}

fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

fn open(builder: &DiskImageBuilder) -> DiskImage<Cursor<Vec<u8>>> {
    let bytes = builder.build().expect("Failed to build image");
    DiskImage::from_reader(Cursor::new(bytes)).expect("Failed to open image")
}

#[test]
fn test_single_record_file() {
    let sector = patterned(512, 7);
    let mut builder = DiskImageBuilder::new()
        .disk_class(DiskClass::System)
        .num_tracks(3);
    builder.write_block(2, &sector).unwrap();
    builder
        .write_dir_entry(0, &dir_entry(0, b"A       TXT", 0, 1, &[2]))
        .unwrap();

    let mut image = open(&builder);
    let mut sink = MemorySink::new();
    let report = extract_to_sink(&mut image, &mut sink).expect("Extraction failed");

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].name, "A.TXT");
    assert_eq!(report.files[0].size, 128);
    assert_eq!(report.skipped, 63);
    assert_eq!(sink.get("A.TXT"), Some(&sector[..128]));
}

#[test]
fn test_bad_signature() {
    let mut bytes = DiskImageBuilder::new().build().unwrap();
    bytes[..8].copy_from_slice(b"BAD TYPE");

    let result = DiskImage::from_reader(Cursor::new(bytes));
    assert!(matches!(result, Err(DskError::UnknownFormat(_))));
}

#[test]
fn test_extended_too_many_tracks() {
    let mut header = vec![0u8; 0x100];
    header[..8].copy_from_slice(b"EXTENDED");
    header[0x30] = 253;
    header[0x31] = 1;

    let result = DiskImage::from_reader(Cursor::new(header));
    assert!(matches!(result, Err(DskError::TooLarge { tracks: 253, .. })));

    let result = DiskImageBuilder::new()
        .format(DiskImageFormat::ExtendedDSK)
        .num_tracks(253)
        .build();
    assert!(matches!(result, Err(DskError::TooLarge { .. })));
}

#[test]
fn test_multi_extent_file() {
    // 16 full blocks in extent 0, then 2.5 sectors in extent 1
    let first = patterned(16 * 1024, 1);
    let second = patterned(1024 + 512, 99);

    let mut builder = DiskImageBuilder::new()
        .format(DiskImageFormat::ExtendedDSK)
        .num_tracks(10)
        .interleave(&[0, 5, 1, 6, 2, 7, 3, 8, 4]);
    builder.write_block(2, &first).unwrap();
    builder.write_block(18, &second).unwrap();

    let blocks: Vec<u8> = (2..18).collect();
    builder
        .write_dir_entry(0, &dir_entry(0, b"BIG     DAT", 0, 128, &blocks))
        .unwrap();
    builder
        .write_dir_entry(1, &dir_entry(0, b"BIG     DAT", 1, 10, &[18, 19]))
        .unwrap();

    let mut image = open(&builder);
    let mut sink = MemorySink::new();
    let report = extract_to_sink(&mut image, &mut sink).unwrap();

    let mut expected = first.clone();
    expected.extend_from_slice(&second[..10 * 128]);

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].extents, 2);
    assert_eq!(report.files[0].size, expected.len() as u64);
    assert_eq!(sink.get("BIG.DAT"), Some(expected.as_slice()));
    assert_eq!(image.read_file("big.dat").unwrap(), Some(expected));
}

#[test]
fn test_skips_deleted_foreign_and_blank_entries() {
    let mut builder = DiskImageBuilder::new().num_tracks(4);
    builder.write_block(2, &patterned(1024, 3)).unwrap();
    builder
        .write_dir_entry(0, &dir_entry(0xE5, b"DELETED TXT", 0, 8, &[2]))
        .unwrap();
    builder
        .write_dir_entry(1, &dir_entry(1, b"USER1   TXT", 0, 8, &[2]))
        .unwrap();
    builder
        .write_dir_entry(2, &dir_entry(0, b"        TXT", 0, 8, &[2]))
        .unwrap();
    builder
        .write_dir_entry(3, &dir_entry(0, b"KEEP    TXT", 0, 8, &[2]))
        .unwrap();

    let mut image = open(&builder);
    let mut sink = MemorySink::new();
    let report = extract_to_sink(&mut image, &mut sink).unwrap();

    let names: Vec<&str> = sink.files().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["KEEP.TXT"]);
    assert_eq!(report.skipped, 63);
}

#[test]
fn test_attributes_do_not_change_name() {
    let mut name = *b"SECRET  COM";
    name[8] |= 0x80; // read-only
    name[9] |= 0x80; // system

    let mut builder = DiskImageBuilder::new().num_tracks(4);
    builder.write_block(2, &patterned(256, 5)).unwrap();
    builder.write_dir_entry(0, &dir_entry(0, &name, 0, 2, &[2])).unwrap();

    let mut image = open(&builder);
    let catalog = image.catalog().unwrap();
    assert_eq!(catalog[0].name, "SECRET.COM");
    assert!(catalog[0].attributes.read_only());
    assert!(catalog[0].attributes.system());
    assert!(!catalog[0].attributes.archive());

    let mut sink = MemorySink::new();
    extract_to_sink(&mut image, &mut sink).unwrap();
    assert_eq!(sink.get("SECRET.COM").map(|d| d.len()), Some(256));
}

#[test]
fn test_error_aborts_extraction() {
    let mut builder = DiskImageBuilder::new().num_tracks(3);
    builder.write_block(2, &patterned(1024, 9)).unwrap();
    builder
        .write_dir_entry(0, &dir_entry(0, b"FIRST   BIN", 0, 8, &[2]))
        .unwrap();
    // Block 20 lives on track 4, past the end of the image
    builder
        .write_dir_entry(1, &dir_entry(0, b"SECOND  BIN", 0, 8, &[20]))
        .unwrap();
    builder
        .write_dir_entry(2, &dir_entry(0, b"THIRD   BIN", 0, 8, &[2]))
        .unwrap();

    let mut image = open(&builder);
    let mut sink = MemorySink::new();
    let result = extract_to_sink(&mut image, &mut sink);

    assert!(matches!(result, Err(DskError::TooLarge { .. })));
    assert!(sink.get("FIRST.BIN").is_some());
    assert!(sink.get("THIRD.BIN").is_none());
}

#[test]
fn test_corrupt_data_track_reports_validator_error() {
    let mut builder = DiskImageBuilder::new().num_tracks(3);
    builder
        .write_dir_entry(0, &dir_entry(0, b"FILE    BIN", 0, 8, &[5]))
        .unwrap();
    let mut bytes = builder.build().unwrap();
    // Block 5 starts on track 1; break that track's side number
    bytes[0x100 + 0x1300 + 0x11] = 1;

    let mut image = DiskImage::from_reader(Cursor::new(bytes)).unwrap();
    let result = extract_to_sink(&mut image, &mut MemorySink::new());
    assert!(matches!(
        result,
        Err(DskError::UnexpectedSide { track: 1, found: 1 })
    ));
}

#[test]
fn test_extract_to_directory_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("disk.dsk");
    let output = dir.path().join("out");
    std::fs::create_dir(&output).unwrap();

    let contents = patterned(24 * 128, 17);
    let mut builder = DiskImageBuilder::new()
        .disk_class(DiskClass::System)
        .num_tracks(8);
    builder.write_block(2, &contents).unwrap();
    builder
        .write_dir_entry(0, &dir_entry(0, b"PROG    BAS", 0, 24, &[2, 3, 4]))
        .unwrap();
    builder.save(&image_path).unwrap();

    extract_image(&image_path, &output).unwrap();
    let first = std::fs::read(output.join("PROG.BAS")).unwrap();
    extract_image(&image_path, &output).unwrap();
    let second = std::fs::read(output.join("PROG.BAS")).unwrap();

    assert_eq!(first.len(), 3072);
    assert_eq!(first, contents);
    assert_eq!(first, second);
}

#[test]
fn test_unsafe_names_stay_in_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    std::fs::create_dir(&output).unwrap();

    let mut builder = DiskImageBuilder::new().num_tracks(4);
    builder.write_block(2, b"escape").unwrap();
    builder
        .write_dir_entry(0, &dir_entry(0, b"..         ", 0, 1, &[2]))
        .unwrap();
    builder
        .write_dir_entry(1, &dir_entry(0, b"A/B     TXT", 0, 1, &[2]))
        .unwrap();

    let mut image = open(&builder);
    let report = extract_to_sink(&mut image, &mut DirectorySink::new(&output)).unwrap();

    assert_eq!(report.files.len(), 2);
    assert!(output.join("__").is_file());
    assert!(output.join("A_B.TXT").is_file());
}

#[test]
fn test_missing_image_is_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_image(dir.path().join("missing.dsk"), dir.path());
    assert!(matches!(result, Err(DskError::FileError(_))));
}

#[test]
fn test_colliding_host_names_get_separate_files() {
    let dir = tempfile::tempdir().unwrap();

    let mut builder = DiskImageBuilder::new().num_tracks(4);
    builder.write_block(2, &[b'x'; 1024]).unwrap();
    builder.write_block(3, &[b'y'; 1024]).unwrap();
    builder
        .write_dir_entry(0, &dir_entry(0, b"A_B     TXT", 0, 8, &[2]))
        .unwrap();
    builder
        .write_dir_entry(1, &dir_entry(0, b"A/B     TXT", 0, 2, &[3]))
        .unwrap();

    let mut image = open(&builder);
    let report = extract_to_sink(&mut image, &mut DirectorySink::new(dir.path())).unwrap();

    let sizes: Vec<u64> = report.files.iter().map(|f| f.size).collect();
    assert_eq!(sizes, vec![1024, 256]);
    assert_eq!(std::fs::read(dir.path().join("A_B.TXT")).unwrap(), vec![b'x'; 1024]);
    assert_eq!(std::fs::read(dir.path().join("A_B.TXT~1")).unwrap(), vec![b'y'; 256]);
}

#[test]
fn test_first_sector_id_must_be_class_base() {
    // Track 0 starts with ID 0xC5, a data disk ID but not the base
    let builder = DiskImageBuilder::new()
        .num_tracks(2)
        .track_interleave(0, &[4, 0, 5, 1, 6, 2, 7, 3, 8]);
    let result = DiskImage::from_reader(Cursor::new(builder.build().unwrap()));
    assert!(matches!(result, Err(DskError::UnsupportedFormat(_))));

    // Interleave on later tracks leaves the probe alone
    let builder = DiskImageBuilder::new()
        .disk_class(DiskClass::System)
        .num_tracks(3)
        .track_interleave(2, &[4, 0, 5, 1, 6, 2, 7, 3, 8]);
    let image = DiskImage::from_reader(Cursor::new(builder.build().unwrap())).unwrap();
    assert_eq!(image.disk_class(), DiskClass::System);
}

fn two_extent_image(path: &std::path::Path, extent_one_first: bool) -> Vec<u8> {
    let first = patterned(16 * 1024, 21);
    let second = patterned(1024, 77);

    let mut builder = DiskImageBuilder::new().num_tracks(10);
    builder.write_block(2, &first).unwrap();
    builder.write_block(18, &second).unwrap();

    let blocks: Vec<u8> = (2..18).collect();
    let extent_zero = dir_entry(0, b"BIG     DAT", 0, 128, &blocks);
    let extent_one = dir_entry(0, b"BIG     DAT", 1, 8, &[18]);
    let (slot_zero, slot_one) = if extent_one_first { (1, 0) } else { (0, 1) };
    builder.write_dir_entry(slot_zero, &extent_zero).unwrap();
    builder.write_dir_entry(slot_one, &extent_one).unwrap();
    builder.save(path).unwrap();

    // Extents are appended in directory order
    if extent_one_first {
        [second, first].concat()
    } else {
        [first, second].concat()
    }
}

#[test]
fn test_multi_extent_replaces_existing_host_file() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("big.dsk");
    let output = dir.path().join("out");
    std::fs::create_dir(&output).unwrap();
    std::fs::write(output.join("BIG.DAT"), vec![0xFF; 40000]).unwrap();

    let expected = two_extent_image(&image_path, false);

    let report = extract_image(&image_path, &output).unwrap();
    assert_eq!(report.files[0].extents, 2);
    let first = std::fs::read(output.join("BIG.DAT")).unwrap();
    extract_image(&image_path, &output).unwrap();
    let second = std::fs::read(output.join("BIG.DAT")).unwrap();

    assert_eq!(first.len(), 17 * 1024);
    assert_eq!(first, expected);
    assert_eq!(first, second);
}

#[test]
fn test_out_of_order_extents_append_in_directory_order() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("big.dsk");
    let output = dir.path().join("out");
    std::fs::create_dir(&output).unwrap();
    std::fs::write(output.join("BIG.DAT"), b"stale").unwrap();

    let expected = two_extent_image(&image_path, true);

    let report = extract_image(&image_path, &output).unwrap();
    assert_eq!(report.files[0].size, expected.len() as u64);
    let first = std::fs::read(output.join("BIG.DAT")).unwrap();
    extract_image(&image_path, &output).unwrap();
    let second = std::fs::read(output.join("BIG.DAT")).unwrap();

    assert_eq!(first, expected);
    assert_eq!(first, second);

    let mut image = DiskImage::open(&image_path).unwrap();
    let mut sink = MemorySink::new();
    extract_to_sink(&mut image, &mut sink).unwrap();
    let files = sink.into_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files["BIG.DAT"], expected);
}

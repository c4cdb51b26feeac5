/// DSK extraction tool and interactive console

use clap::{arg, crate_version, ArgAction, Command};
use dskextract::*;
use log::error;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

type OpenImage = DiskImage<BufReader<File>>;

/// Command completer for the console
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "cat", "dir", "exit", "extract", "help", "info", "load", "ls", "open", "quit",
                "read",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let long_help = "Without an image the interactive console starts.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
extract all files:   `dsk game.dsk -o game`
list files:          `dsk game.dsk --list`
trace sector reads:  `RUST_LOG=trace dsk game.dsk`";

    let matches = Command::new("dsk")
        .about("Extracts the CP/M files of Amstrad CPC DSK disk images.")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!([IMAGE] "disk image to extract"))
        .arg(
            arg!(-o --output <DIR> "directory to extract into")
                .required(false)
                .default_value("."),
        )
        .arg(arg!(-l --list "list files instead of extracting").action(ArgAction::SetTrue))
        .get_matches();

    let Some(image_path) = matches.get_one::<String>("IMAGE") else {
        console();
        return ExitCode::SUCCESS;
    };
    let output = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(".");

    let result = if matches.get_flag("list") {
        DiskImage::open(image_path)
            .and_then(|mut image| image.catalog())
            .map(|catalog| print_catalog(&catalog))
    } else {
        extract_into(image_path, output).map(|report| print_report(&report))
    };

    match result {
        Ok(()) => {
            eprintln!("DSK_OK");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.name());
            ExitCode::FAILURE
        }
    }
}

fn extract_into<P: AsRef<Path>>(image_path: &str, output: P) -> Result<ExtractReport> {
    std::fs::create_dir_all(&output)?;
    extract_image(image_path, output)
}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".dskextract_history");
        p
    })
}

fn console() {
    println!("=== dskextract ===");
    println!("Interactive console for CPC DSK disk images.");
    println!("Type 'help' for available commands\n");

    let mut rl: Editor<CommandCompleter, DefaultHistory> = match Editor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Error: {}", err);
            return;
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut image: Option<OpenImage> = None;

    loop {
        let input = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        let Some(command) = parts.first().map(|c| c.to_lowercase()) else {
            continue;
        };

        match command.as_str() {
            "help" => print_help(),
            "quit" | "exit" => break,
            "open" | "load" => {
                let Some(path) = parts.get(1) else {
                    println!("Usage: open <path>");
                    continue;
                };
                match DiskImage::open(path) {
                    Ok(img) => {
                        println!("Opened: {}", path);
                        image = Some(img);
                    }
                    Err(e) => println!("Error: {} ({})", e, e.name()),
                }
            }
            "info" => match image.as_mut() {
                Some(img) => print_info(img),
                None => println!("No image loaded."),
            },
            "dir" | "ls" | "cat" => match image.as_mut() {
                Some(img) => match img.catalog() {
                    Ok(catalog) => print_catalog(&catalog),
                    Err(e) => println!("Error: {} ({})", e, e.name()),
                },
                None => println!("No image loaded."),
            },
            "read" => {
                let (Some(img), Some(name)) = (image.as_mut(), parts.get(1)) else {
                    println!("Usage: read <filename> (with an image loaded)");
                    continue;
                };
                match img.read_file(name) {
                    Ok(Some(data)) => {
                        println!("File: {} ({} bytes)", name, data.len());
                        print_hex_dump(&data, 256);
                    }
                    Ok(None) => println!("File not found: {}", name),
                    Err(e) => println!("Error: {} ({})", e, e.name()),
                }
            }
            "extract" => {
                let Some(img) = image.as_mut() else {
                    println!("No image loaded.");
                    continue;
                };
                let output = parts.get(1).map(String::as_str).unwrap_or(".");
                let result = std::fs::create_dir_all(output)
                    .map_err(DskError::from)
                    .and_then(|_| extract_to_sink(img, &mut DirectorySink::new(output)));
                match result {
                    Ok(report) => print_report(&report),
                    Err(e) => println!("Error: {} ({})", e, e.name()),
                }
            }
            _ => println!("Unknown command '{}'. Type 'help' for available commands.", command),
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
    println!("Goodbye!");
}

/// Parse command line input, respecting quoted strings
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  open <path>        - Open a disk image file (use quotes for paths with spaces)");
    println!("  info               - Show disk information");
    println!("  dir                - List files on disk (ls, cat)");
    println!("  read <filename>    - Read and hex dump a file");
    println!("  extract [dir]      - Extract all files (defaults to the current directory)");
    println!("  help               - Show this help");
    println!("  quit, exit         - Exit");
}

fn print_info(image: &mut OpenImage) {
    let header = image.header().clone();
    let class = image.disk_class();

    println!("Format: {}", header.format.name());
    println!("Tracks: {}", header.num_tracks);
    println!("Sides: {}", header.num_sides);
    match &header.track_sizes {
        TrackSizes::Fixed(size) => println!("Track size: {} bytes", size),
        TrackSizes::PerTrack(sizes) => {
            let distinct: std::collections::BTreeSet<_> = sizes.iter().collect();
            println!("Track sizes: {:?} x 256 bytes", distinct);
        }
    }
    println!("Disk class: {} (first sector ID {:#04x})", class.name(), class.first_sector_id());
    println!("Directory track: {}", class.directory_track());

    match image.entries() {
        Ok(entries) => println!("Directory entries in use: {}", entries.len()),
        Err(e) => println!("Directory: {} ({})", e, e.name()),
    }
}

fn print_catalog(catalog: &[CatalogEntry]) {
    println!("{:<12} {:>8} {:>7} {:>6} {:<4}", "Name", "Size", "Records", "Blocks", "Attr");
    println!("{}", "-".repeat(41));
    for file in catalog {
        println!(
            "{:<12} {:>8} {:>7} {:>6} {:<4}",
            file.name, file.size, file.records, file.blocks, file.attributes
        );
    }
    println!("{} file(s)", catalog.len());
}

fn print_report(report: &ExtractReport) {
    for file in &report.files {
        println!("{:<12} {:>8} bytes ({} extent(s))", file.name, file.size, file.extents);
    }
    println!("{} file(s) extracted", report.files.len());
}

fn print_hex_dump(data: &[u8], max_bytes: usize) {
    let len = data.len().min(max_bytes);

    for (i, chunk) in data[..len].chunks(16).enumerate() {
        print!("{:04X}: ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            print!("{:02X} ", byte);
            if j == 7 {
                print!(" ");
            }
        }

        // Pad if less than 16 bytes
        for j in chunk.len()..16 {
            print!("   ");
            if j == 7 {
                print!(" ");
            }
        }

        print!(" |");
        for byte in chunk {
            let c = if (32..127).contains(byte) { *byte as char } else { '.' };
            print!("{}", c);
        }
        println!("|");
    }

    if data.len() > max_bytes {
        println!("... ({} more bytes)", data.len() - max_bytes);
    }
}

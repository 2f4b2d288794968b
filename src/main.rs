//! Main entry point for the storezip CLI application.
//!
//! Creates uncompressed ZIP archives from local files and lists or
//! verifies existing ones.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::warn;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use storezip::cli::Command;
use storezip::{Cli, LocalFileReader, ReadAt, ZipExtractor, ZipWriter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match &cli.command {
        Command::Create {
            output,
            files,
            junk_paths,
        } => create_archive(output, files, *junk_paths, &cli).await,
        Command::List { archive, verbose } => {
            let reader = open_archive(archive)?;
            list_files(&ZipExtractor::new(reader), *verbose).await
        }
        Command::Test { archive } => {
            let reader = open_archive(archive)?;
            test_archive(&ZipExtractor::new(reader), &cli).await
        }
    }
}

fn open_archive(path: &Path) -> Result<Arc<LocalFileReader>> {
    let reader = LocalFileReader::new(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    Ok(Arc::new(reader))
}

/// Store each file under its archive name and write the result to `output`.
///
/// Directories are skipped with a warning; any unreadable file aborts the
/// whole archive.
async fn create_archive(
    output: &Path,
    files: &[PathBuf],
    junk_paths: bool,
    cli: &Cli,
) -> Result<()> {
    let mut writer = ZipWriter::new();

    for path in files {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("cannot stat {}", path.display()))?;
        if metadata.is_dir() {
            warn!("skipping directory {}", path.display());
            continue;
        }

        let Some(name) = archive_name(path, junk_paths) else {
            warn!("skipping {}: no usable entry name", path.display());
            continue;
        };

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;

        if !cli.is_quiet() {
            println!("  adding: {} ({})", name, format_size(data.len() as u64));
        }

        writer
            .add(&name, &data)
            .with_context(|| format!("cannot add {}", path.display()))?;
    }

    let archive = writer.finish()?;
    tokio::fs::write(output, archive.as_bytes())
        .await
        .with_context(|| format!("cannot write {}", output.display()))?;

    if !cli.is_quiet() {
        println!(
            "wrote {} ({} entries, {})",
            output.display(),
            archive.entry_count(),
            format_size(archive.len() as u64)
        );
    }

    Ok(())
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format: just file names, one per line
/// - Verbose format (`-v`): table with size, CRC and timestamp
async fn list_files<R: ReadAt + 'static>(
    extractor: &ZipExtractor<R>,
    verbose: bool,
) -> Result<()> {
    let entries = extractor.list_files().await?;

    if !verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>8}  {:>10}  {:>5}  Name",
        "Length", "CRC-32", "Date", "Time"
    );
    println!("{}", "-".repeat(60));

    let mut total_size = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let modified = entry.modified;
        println!(
            "{:>10}  {:08x}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.crc32,
            modified.year(),
            modified.month(),
            modified.day(),
            modified.hour(),
            modified.minute(),
            entry.file_name
        );

        if !entry.is_directory {
            total_size += entry.uncompressed_size as u64;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!("{:>10}  {:>27}  {} files", total_size, "", file_count);

    Ok(())
}

/// Read every entry back, reporting each one, and fail if any CRC is off.
async fn test_archive<R: ReadAt + 'static>(
    extractor: &ZipExtractor<R>,
    cli: &Cli,
) -> Result<()> {
    let entries = extractor.list_files().await?;
    let mut failures = 0usize;

    for entry in &entries {
        match extractor.extract_to_memory(entry).await {
            Ok(_) => {
                if !cli.is_quiet() {
                    println!("    testing: {:<40}  OK", entry.file_name);
                }
            }
            Err(e) => {
                failures += 1;
                if !cli.is_very_quiet() {
                    eprintln!("    testing: {:<40}  {}", entry.file_name, e);
                }
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} entries failed verification", failures, entries.len());
    }

    if !cli.is_very_quiet() {
        println!("No errors detected in {} entries.", entries.len());
    }

    Ok(())
}

/// Build a `/`-separated entry name from a file path.
///
/// Root, prefix, `.` and `..` components are dropped so entries never
/// escape the extraction directory. With `junk_paths` only the base name
/// is kept.
fn archive_name(path: &Path, junk_paths: bool) -> Option<String> {
    if junk_paths {
        return path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
    }

    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_name(Path::new("a.txt"), false).as_deref(), Some("a.txt"));
        assert_eq!(
            archive_name(Path::new("./docs/guide/intro.md"), false).as_deref(),
            Some("docs/guide/intro.md")
        );
        assert_eq!(
            archive_name(Path::new("/tmp/../etc/passwd"), false).as_deref(),
            Some("tmp/etc/passwd")
        );
        assert_eq!(
            archive_name(Path::new("docs/guide/intro.md"), true).as_deref(),
            Some("intro.md")
        );
        assert_eq!(archive_name(Path::new("/"), false), None);
        assert_eq!(archive_name(Path::new(".."), true), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}

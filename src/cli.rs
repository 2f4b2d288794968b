use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "storezip")]
#[command(version)]
#[command(about = "Pack files into an uncompressed ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  storezip create out.zip a.txt docs/b.md   store two files under their relative paths\n  \
  storezip create -j out.zip /tmp/log.txt   store a file as log.txt\n  \
  storezip list -v out.zip                  list entries with sizes, CRCs and dates\n  \
  storezip test out.zip                     check every entry's CRC")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an archive from files
    Create {
        /// Archive to write
        #[arg(value_name = "ZIPFILE")]
        output: PathBuf,

        /// Files to store, in order
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Junk paths (store base names only)
        #[arg(short = 'j')]
        junk_paths: bool,
    },

    /// List archive entries
    List {
        /// Archive to read
        #[arg(value_name = "ZIPFILE")]
        archive: PathBuf,

        /// Show sizes, CRCs and timestamps
        #[arg(short = 'v')]
        verbose: bool,
    },

    /// Read every entry back and verify its CRC
    Test {
        /// Archive to read
        #[arg(value_name = "ZIPFILE")]
        archive: PathBuf,
    },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log level, before `RUST_LOG` is applied.
    pub fn log_level(&self) -> LevelFilter {
        if self.is_very_quiet() {
            LevelFilter::Off
        } else if self.is_quiet() {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        }
    }
}

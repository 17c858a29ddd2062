//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flashstore")]
#[command(author, version, about = "Journaling flash storage tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Flash image file to operate on (created on first write)
    #[arg(short, long, global = true, default_value = "storage.img")]
    pub image: PathBuf,

    /// Erase page size in bytes
    #[arg(long, global = true, default_value_t = 4096)]
    pub page_size: u32,

    /// Size of a newly created image in bytes
    #[arg(long, global = true, default_value_t = 65536)]
    pub size: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List live files
    List,

    /// Read a file to stdout or a file
    Read {
        /// Name of the file to read
        name: String,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write or create a file
    Write {
        /// Name of the file to write
        name: String,

        /// Input file with the data (stdin if neither --input nor --data)
        #[arg(short = 'f', long, conflicts_with = "data")]
        input: Option<PathBuf>,

        /// Literal data to write
        #[arg(short, long)]
        data: Option<String>,

        /// Offset within a pre-allocated file
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Reserve this body size and fill it later
        #[arg(long, default_value_t = 0)]
        total_size: u32,
    },

    /// Mark a file deleted
    Erase {
        /// Name of the file to delete
        name: String,
    },

    /// Erase the whole storage region
    EraseAll,

    /// Drop superseded and deleted records
    Compact,

    /// Show free space
    Free {
        /// Total free bytes instead of the largest writable file
        #[arg(long)]
        total: bool,
    },

    /// Dump every journal record, including dead ones
    Debug,

    /// Append data to a stream file
    Append {
        /// Stream name (at most 7 bytes)
        name: String,

        /// Input file with the data (stdin if neither --input nor --data)
        #[arg(short = 'f', long, conflicts_with = "data")]
        input: Option<PathBuf>,

        /// Literal data to append
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Read a whole stream file to stdout
    Cat {
        /// Stream name (at most 7 bytes)
        name: String,
    },

    /// Read a stream file line by line
    Lines {
        /// Stream name (at most 7 bytes)
        name: String,
    },
}

//! flashstore - journaling flash storage inspector and editor
//!
//! Drives the storage core against a flash image file through the
//! in-memory emulator, so on-device images can be built and inspected
//! from a host machine.

mod cli;
mod commands;
mod image;

use clap::Parser;
use cli::{Cli, Commands};
use flashstore_core::config::Geometry;
use flashstore_core::store::Store;

/// Errors surfaced to the user by the CLI
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("storage error: {0}")]
    Store(#[from] flashstore_core::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no such file: {0}")]
    NotFound(String),
    #[error("image size {0} is not a non-zero multiple of the page size {1}")]
    BadImage(u64, u32),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let flash = image::load(&cli.image, cli.page_size, cli.size)?;
    let len = flash.config().size as u32;
    let geo = Geometry::new(0, len, cli.page_size)?;
    let mut store = Store::new(flash, geo)?;

    // Commands that change the region write the image back afterwards.
    let mutated = match &cli.command {
        Commands::List => {
            commands::list::run(&mut store)?;
            false
        }
        Commands::Read { name, output } => {
            commands::read::run(&mut store, name, output.as_deref())?;
            false
        }
        Commands::Write {
            name,
            input,
            data,
            offset,
            total_size,
        } => {
            let data = commands::read_input(input.as_deref(), data.as_deref())?;
            commands::write::run(&mut store, name, &data, *offset, *total_size)?;
            true
        }
        Commands::Erase { name } => {
            commands::erase::run(&mut store, name)?;
            true
        }
        Commands::EraseAll => {
            store.erase_all()?;
            println!("Erased {} pages", store.geometry().page_count());
            true
        }
        Commands::Compact => {
            commands::compact::run(&mut store)?;
            true
        }
        Commands::Free { total } => {
            commands::free::run(&mut store, *total)?;
            false
        }
        Commands::Debug => {
            commands::debug::run(&mut store)?;
            false
        }
        Commands::Append { name, input, data } => {
            let data = commands::read_input(input.as_deref(), data.as_deref())?;
            commands::stream::append(&mut store, name, &data)?;
            true
        }
        Commands::Cat { name } => {
            commands::stream::cat(&mut store, name)?;
            false
        }
        Commands::Lines { name } => {
            commands::stream::lines(&mut store, name)?;
            false
        }
    };

    if mutated {
        image::save(&cli.image, store.flash())?;
    }
    Ok(())
}

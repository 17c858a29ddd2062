//! Stream file commands: append, cat, lines

use std::io::Write;

use flashstore_core::store::Store;
use flashstore_core::stream::{Mode, StreamFile};
use flashstore_memflash::MemFlash;

use crate::CliError;

/// How much to ask for per read when dumping a stream
const CAT_CHUNK: usize = 4096;

pub fn append(store: &mut Store<MemFlash>, name: &str, data: &[u8]) -> Result<(), CliError> {
    let mut file = StreamFile::open(store, name.as_bytes(), Mode::Append)?;
    file.write(store, data)?;
    println!(
        "Appended {} bytes to {} (chunk {}, offset {})",
        data.len(),
        file.name(),
        file.chunk(),
        file.offset()
    );
    Ok(())
}

pub fn cat(store: &mut Store<MemFlash>, name: &str) -> Result<(), CliError> {
    let mut file = StreamFile::open(store, name.as_bytes(), Mode::Read)?;
    let mut stdout = std::io::stdout();
    while let Some(bytes) = file.read(store, CAT_CHUNK)? {
        stdout.write_all(&bytes)?;
    }
    Ok(())
}

pub fn lines(store: &mut Store<MemFlash>, name: &str) -> Result<(), CliError> {
    let mut file = StreamFile::open(store, name.as_bytes(), Mode::Read)?;
    let mut n = 1usize;
    while let Some(line) = file.read_line(store)? {
        print!("{:>4}: {}", n, String::from_utf8_lossy(&line));
        if !line.ends_with(b"\n") {
            println!();
        }
        n += 1;
    }
    Ok(())
}

//! Write command implementation

use flashstore_core::store::{FileFlags, FileName, Store};
use flashstore_memflash::MemFlash;

use crate::CliError;

pub fn run(
    store: &mut Store<MemFlash>,
    name: &str,
    data: &[u8],
    offset: u32,
    total_size: u32,
) -> Result<(), CliError> {
    let fname = FileName::try_from(name)?;
    store.write_file(fname, data, FileFlags::empty(), offset, total_size)?;
    println!("Wrote {} bytes to {}", data.len(), fname);
    Ok(())
}

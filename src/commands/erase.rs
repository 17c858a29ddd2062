//! Erase command implementation

use flashstore_core::store::{FileName, Store};
use flashstore_memflash::MemFlash;

use crate::CliError;

pub fn run(store: &mut Store<MemFlash>, name: &str) -> Result<(), CliError> {
    let fname = FileName::try_from(name)?;
    if !store.erase_file(fname)? {
        return Err(CliError::NotFound(name.to_string()));
    }
    println!("Deleted {}", fname);
    Ok(())
}

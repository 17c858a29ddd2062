//! Compact command implementation

use flashstore_core::store::Store;
use flashstore_memflash::MemFlash;

use crate::CliError;

pub fn run(store: &mut Store<MemFlash>) -> Result<(), CliError> {
    let before = store.free_space(false)?;
    store.compact()?;
    let after = store.free_space(false)?;
    println!("Compacted, reclaimed {} bytes", after - before);
    Ok(())
}

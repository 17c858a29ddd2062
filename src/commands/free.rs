//! Free-space command implementation

use flashstore_core::store::Store;
use flashstore_memflash::MemFlash;

use crate::CliError;

pub fn run(store: &mut Store<MemFlash>, total: bool) -> Result<(), CliError> {
    let bytes = store.free_space(!total)?;
    if total {
        println!("{} bytes free in total (compaction may be needed)", bytes);
    } else {
        println!("{} bytes (largest file writable right now)", bytes);
    }
    Ok(())
}

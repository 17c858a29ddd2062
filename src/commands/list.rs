//! List command implementation

use flashstore_core::store::Store;
use flashstore_memflash::MemFlash;

use crate::CliError;

pub fn run(store: &mut Store<MemFlash>) -> Result<(), CliError> {
    let names = store.list_files()?;
    for name in &names {
        let Some((_, header)) = store.find_file(*name)? else {
            continue;
        };
        println!("{:<12} {:>8} bytes", format!("{}", name), header.size);
    }
    println!("{} file(s)", names.len());
    Ok(())
}

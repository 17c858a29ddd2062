//! Journal dump command implementation

use flashstore_core::store::{RecordState, Store};
use flashstore_memflash::MemFlash;

use crate::CliError;

pub fn run(store: &mut Store<MemFlash>) -> Result<(), CliError> {
    let mut count = 0usize;
    store.debug_files(|rec| {
        count += 1;
        let state = match rec.state {
            RecordState::Live => "live",
            RecordState::Deleted => "deleted",
            RecordState::Torn => "torn",
        };
        println!(
            "{:#010x} {:<12} {:>8} bytes  flags={:04x}  {}",
            rec.addr,
            format!("{}", rec.header.name),
            rec.header.size,
            rec.header.flags().bits(),
            state
        );
    })?;
    println!("{} record(s)", count);
    Ok(())
}

//! Read command implementation

use std::io::Write;
use std::path::Path;

use flashstore_core::store::{FileName, Store};
use flashstore_memflash::MemFlash;

use crate::CliError;

pub fn run(store: &mut Store<MemFlash>, name: &str, output: Option<&Path>) -> Result<(), CliError> {
    let fname = FileName::try_from(name)?;
    let Some(body) = store.read_file(fname)? else {
        return Err(CliError::NotFound(name.to_string()));
    };
    match output {
        Some(path) => {
            std::fs::write(path, &body)?;
            println!("Wrote {} bytes to {}", body.len(), path.display());
        }
        None => {
            std::io::stdout().write_all(&body)?;
        }
    }
    Ok(())
}

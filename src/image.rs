//! Flash image file handling
//!
//! The CLI operates on a plain file holding the raw contents of the
//! managed region, loaded into the in-memory emulator and written back
//! after mutating commands.

use std::fs;
use std::path::Path;

use flashstore_memflash::{MemConfig, MemFlash};

use crate::CliError;

/// Load `path` into an emulated flash, or create an erased device of
/// `default_size` (rounded up to a page multiple) if the file is absent
pub fn load(path: &Path, page_size: u32, default_size: u32) -> Result<MemFlash, CliError> {
    if path.exists() {
        let bytes = fs::read(path)?;
        if bytes.is_empty() || bytes.len() % page_size as usize != 0 {
            return Err(CliError::BadImage(bytes.len() as u64, page_size));
        }
        let config = MemConfig {
            size: bytes.len(),
            page_size: page_size as usize,
        };
        Ok(MemFlash::with_data(config, &bytes))
    } else {
        let size = default_size.div_ceil(page_size).max(1) * page_size;
        log::debug!("image: creating erased {} byte device", size);
        Ok(MemFlash::new(MemConfig {
            size: size as usize,
            page_size: page_size as usize,
        }))
    }
}

/// Write the device contents back to `path`
pub fn save(path: &Path, flash: &MemFlash) -> Result<(), CliError> {
    fs::write(path, flash.data())?;
    Ok(())
}

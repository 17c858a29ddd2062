//! CLI command implementations

pub mod compact;
pub mod debug;
pub mod erase;
pub mod free;
pub mod list;
pub mod read;
pub mod stream;
pub mod write;

use std::io::Read;
use std::path::Path;

use crate::CliError;

/// Resolve the data argument shared by `write` and `append`: a literal
/// string, a file, or stdin
pub fn read_input(input: Option<&Path>, data: Option<&str>) -> Result<Vec<u8>, CliError> {
    if let Some(data) = data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = input {
        return Ok(std::fs::read(path)?);
    }
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

//! Error types for flashstore-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Argument errors
    /// Filename is empty or longer than the fixed name width
    InvalidName,
    /// Offset does not fall inside the target record
    InvalidOffset,
    /// Operation is not permitted by the stream's open mode
    WrongMode,
    /// Stream handle was erased and can no longer be used
    FileClosed,

    // Space errors
    /// No page can hold the record (journal full)
    NoSpace,
    /// Stream exceeded the maximum chunk index
    FileTooBig,
    /// Not enough RAM to stage data (compaction swap space)
    NoMemory,

    // Flash errors
    /// Read operation failed
    ReadError,
    /// Write/program operation failed
    WriteError,
    /// Erase operation failed
    EraseError,
    /// Erase address is not on a page boundary
    InvalidAlignment,

    // Layout/contract errors
    /// Target bytes are not in the erased state
    NotErased,
    /// Declared size does not match the existing record
    SizeMismatch,
    /// Provided buffer is too small for the record body
    BufferTooSmall,
    /// Address is beyond the managed region or the flash device
    AddressOutOfBounds,
    /// Region configuration is invalid
    InvalidGeometry,
    /// On-flash structures are malformed
    Corrupted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "invalid filename"),
            Self::InvalidOffset => write!(f, "offset outside the record body"),
            Self::WrongMode => write!(f, "operation not allowed in this mode"),
            Self::FileClosed => write!(f, "stream file has been erased"),
            Self::NoSpace => write!(f, "no room for the record"),
            Self::FileTooBig => write!(f, "file too big"),
            Self::NoMemory => write!(f, "not enough memory"),
            Self::ReadError => write!(f, "read operation failed"),
            Self::WriteError => write!(f, "write operation failed"),
            Self::EraseError => write!(f, "erase operation failed"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::NotErased => write!(f, "target bytes are not erased"),
            Self::SizeMismatch => write!(f, "size does not match the existing record"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidGeometry => write!(f, "invalid region geometry"),
            Self::Corrupted => write!(f, "flash contents are corrupted"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

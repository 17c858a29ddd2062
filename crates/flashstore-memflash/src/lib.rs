//! flashstore-memflash - In-memory flash emulator for testing
//!
//! This crate provides a fake NOR flash backed by a byte vector. It
//! honors the physics the store relies on: erased bytes read as `0xFF`,
//! programming can only clear bits, and erase works on whole pages.
//! Operation counters make wear visible to tests.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use flashstore_core::error::{Error, Result};
use flashstore_core::flash::{Flash, ERASED_BYTE};

/// Configuration for the emulated flash
#[derive(Debug, Clone)]
pub struct MemConfig {
    /// Device size in bytes
    pub size: usize,
    /// Erase page size in bytes
    pub page_size: usize,
}

impl Default for MemConfig {
    fn default() -> Self {
        Self {
            size: 256 * 1024,
            page_size: 4096,
        }
    }
}

/// Emulated NOR flash device
pub struct MemFlash {
    config: MemConfig,
    data: Vec<u8>,
    /// Number of read calls
    pub read_count: usize,
    /// Number of program calls
    pub write_count: usize,
    /// Number of page erases
    pub erase_count: usize,
}

impl MemFlash {
    /// Create a fully erased device
    pub fn new(config: MemConfig) -> Self {
        let data = vec![ERASED_BYTE; config.size];
        Self {
            config,
            data,
            read_count: 0,
            write_count: 0,
            erase_count: 0,
        }
    }

    /// Create a device with the default configuration
    pub fn new_default() -> Self {
        Self::new(MemConfig::default())
    }

    /// Create a device pre-filled with `initial_data`
    pub fn with_data(config: MemConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Raw device contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable device contents, for corrupting bytes in tests
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The configuration
    pub fn config(&self) -> &MemConfig {
        &self.config
    }

    /// Zero all operation counters
    pub fn reset_counters(&mut self) {
        self.read_count = 0;
        self.write_count = 0;
        self.erase_count = 0;
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<usize> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(Error::AddressOutOfBounds)?;
        if end > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(start)
    }
}

impl Flash for MemFlash {
    fn size(&self) -> u32 {
        self.config.size as u32
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let start = self.check_range(addr, buf.len())?;
        buf.copy_from_slice(&self.data[start..start + buf.len()]);
        self.read_count += 1;
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let start = self.check_range(addr, data.len())?;
        // NOR programming can only clear bits; reject a write that
        // would need to flip one back to 1
        for (cur, &new) in self.data[start..start + data.len()].iter().zip(data) {
            if new & !cur != 0 {
                log::debug!("memflash: 0->1 flip rejected at {:#x}", addr);
                return Err(Error::WriteError);
            }
        }
        for (cur, &new) in self.data[start..start + data.len()].iter_mut().zip(data) {
            *cur &= new;
        }
        self.write_count += 1;
        Ok(())
    }

    fn erase_page(&mut self, addr: u32) -> Result<()> {
        if addr as usize % self.config.page_size != 0 {
            return Err(Error::InvalidAlignment);
        }
        let start = self.check_range(addr, self.config.page_size)?;
        self.data[start..start + self.config.page_size].fill(ERASED_BYTE);
        self.erase_count += 1;
        Ok(())
    }
}

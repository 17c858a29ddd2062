//! flashstore-core - Journaling file store over raw flash memory
//!
//! This crate implements a small filesystem-like storage layer on top of a
//! raw flash device, plus an append-only stream abstraction that spreads a
//! logical file across multiple fixed-size records. It is designed to be
//! `no_std` compatible for use in embedded environments.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for copy-on-read and compaction
//!
//! # Example
//!
//! ```ignore
//! use flashstore_core::config::Geometry;
//! use flashstore_core::store::{FileFlags, FileName, Store};
//!
//! fn demo<F: flashstore_core::flash::Flash>(flash: F) -> flashstore_core::Result<()> {
//!     let mut store = Store::new(flash, Geometry::new(0, 64 * 1024, 4096)?)?;
//!     let name = FileName::new(b"hello")?;
//!     store.write_file(name, b"Hi", FileFlags::empty(), 0, 0)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod error;
pub mod flash;
pub mod store;
pub mod stream;

pub use error::{Error, Result};

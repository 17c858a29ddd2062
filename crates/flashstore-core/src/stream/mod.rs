//! Append-only stream files spread across sibling records
//!
//! A stream file is a family of records whose names share a prefix and
//! differ only in a trailing chunk index byte (1..=255). Each chunk is
//! pre-allocated to the page's full body capacity; the end of the data
//! inside a chunk is the first [`ERASED_BYTE`], which is why stream
//! content must never contain that byte. Reads walk chunks forward,
//! writes fill the current chunk and allocate the next one on demand.
//!
//! Handles carry no pointer into the store. The cached flash address is
//! revalidated by name at the start of every operation, so compacting
//! the store between operations is safe.

use crate::error::{Error, Result};
use crate::flash::{Flash, ERASED_BYTE};
use crate::store::{FileFlags, FileName, Store, HEADER_SIZE, NAME_LEN};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Highest chunk index; a stream can never outgrow this many chunks
pub const MAX_CHUNK: u8 = 255;

/// Buffer size for the append-mode end-of-data scan
const SCAN_BUF: usize = 64;

/// Buffer size for reads; also the read-line refill budget
const READ_BUF: usize = 32;

/// How a stream file was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read from the start of the stream
    Read,
    /// Truncate the stream and write from the start
    Write,
    /// Continue writing after the last byte already present
    Append,
}

/// Handle to an open stream file
///
/// Plain value owned by the caller; operations take the [`Store`]
/// explicitly. There is no close operation - writes go through
/// immediately. Opening two handles onto the same stream is
/// unsupported.
#[derive(Debug, Clone)]
pub struct StreamFile {
    base: FileName,
    chunk: u8,
    offset: u32,
    /// Cached body address of the current chunk, 0 when the chunk does
    /// not exist yet. Pure optimization; revalidated on entry.
    addr: u32,
    mode: Option<Mode>,
}

impl StreamFile {
    /// Open the stream `name` (at most [`NAME_LEN`]` - 1` bytes)
    ///
    /// `Write` erases any existing chunks so the stream starts empty.
    /// `Append` walks the chunks to the first one that still has erased
    /// tail bytes and scans inside it for the end of the data; a chunk
    /// with no trailing sentinel counts as full, moving the position to
    /// the next index even when that chunk does not exist yet.
    pub fn open<F: Flash>(store: &mut Store<F>, name: &[u8], mode: Mode) -> Result<StreamFile> {
        if name.len() >= NAME_LEN {
            return Err(Error::InvalidName);
        }
        let base = FileName::new(name)?;
        let mut file = StreamFile {
            base,
            chunk: 1,
            offset: 0,
            addr: 0,
            mode: Some(mode),
        };
        file.addr = file.resolve(store, 1)?;
        let chunk_size = store.geometry().chunk_size();
        match mode {
            Mode::Write => {
                if file.addr != 0 {
                    file.erase(store)?;
                    file.mode = Some(Mode::Write);
                }
            }
            Mode::Append => {
                let mut last = [ERASED_BYTE];
                if file.addr != 0 {
                    store.flash_read(file.addr + chunk_size - 1, &mut last)?;
                }
                while file.addr != 0 && last[0] != ERASED_BYTE && file.chunk < MAX_CHUNK {
                    file.chunk += 1;
                    file.addr = file.resolve(store, file.chunk)?;
                    if file.addr != 0 {
                        store.flash_read(file.addr + chunk_size - 1, &mut last)?;
                    }
                }
                if file.addr != 0 {
                    // find the first erased byte inside this chunk
                    let mut buf = [0u8; SCAN_BUF];
                    'scan: while file.offset < chunk_size {
                        let n = SCAN_BUF.min((chunk_size - file.offset) as usize);
                        store.flash_read(file.addr + file.offset, &mut buf[..n])?;
                        for (i, &b) in buf[..n].iter().enumerate() {
                            if b == ERASED_BYTE {
                                file.offset += i as u32;
                                break 'scan;
                            }
                        }
                        file.offset += n as u32;
                    }
                }
            }
            Mode::Read => {}
        }
        log::debug!(
            "stream: open {} chunk {} offset {} addr {:#x}",
            file.base,
            file.chunk,
            file.offset,
            file.addr
        );
        Ok(file)
    }

    /// The stream's base name
    pub fn name(&self) -> &FileName {
        &self.base
    }

    /// Current chunk index
    pub fn chunk(&self) -> u8 {
        self.chunk
    }

    /// Bytes consumed (read) or written within the current chunk
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Open mode, or `None` once the stream has been erased
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    fn chunk_name(&self) -> FileName {
        self.base.with_chunk(self.chunk)
    }

    /// Body address of chunk `chunk`, or 0 if the record is absent
    fn resolve<F: Flash>(&self, store: &mut Store<F>, chunk: u8) -> Result<u32> {
        Ok(match store.find_file(self.base.with_chunk(chunk))? {
            Some((addr, _)) => addr + HEADER_SIZE,
            None => 0,
        })
    }

    /// Re-resolve the cached address; compaction moves records around
    fn revalidate<F: Flash>(&mut self, store: &mut Store<F>) -> Result<()> {
        if self.addr != 0 {
            self.addr = self.resolve(store, self.chunk)?;
        }
        Ok(())
    }

    #[cfg(feature = "alloc")]
    fn read_internal<F: Flash>(
        &mut self,
        store: &mut Store<F>,
        len: usize,
        line: bool,
    ) -> Result<Option<Vec<u8>>> {
        match self.mode {
            Some(Mode::Read) => {}
            Some(_) => return Err(Error::WrongMode),
            None => return Err(Error::FileClosed),
        }
        self.revalidate(store)?;
        if self.addr == 0 {
            return Ok(None); // already at end of stream
        }
        let chunk_size = store.geometry().chunk_size();
        let mut buf = [0u8; READ_BUF];
        let mut want_line = line;
        let mut budget = if line { READ_BUF } else { len };
        let mut result: Option<Vec<u8>> = None;
        while budget > 0 {
            let mut remaining = chunk_size - self.offset;
            if remaining == 0 {
                self.offset = 0;
                if self.chunk == MAX_CHUNK {
                    self.addr = 0;
                } else {
                    self.chunk += 1;
                    self.addr = self.resolve(store, self.chunk)?;
                }
                if self.addr == 0 {
                    return Ok(result);
                }
                remaining = chunk_size;
            }
            let mut l = budget.min(READ_BUF).min(remaining as usize);
            store.flash_read(self.addr + self.offset, &mut buf[..l])?;
            let mut done = false;
            for i in 0..l {
                if buf[i] == ERASED_BYTE {
                    // end of data
                    l = i;
                    done = true;
                    break;
                }
                if want_line && buf[i] == b'\n' {
                    l = i + 1;
                    done = true;
                    want_line = false;
                    break;
                }
            }
            if l == 0 {
                break;
            }
            let out = result.get_or_insert_with(Vec::new);
            out.try_reserve(l).map_err(|_| Error::NoMemory)?;
            out.extend_from_slice(&buf[..l]);
            self.offset += l as u32;
            if done {
                break;
            }
            budget -= l;
            if want_line {
                budget = READ_BUF;
            }
        }
        Ok(result)
    }

    /// Read up to `len` bytes, walking chunks as needed
    ///
    /// Stops early at the first [`ERASED_BYTE`], at a missing chunk, or
    /// past the last chunk index. Returns `None` once no bytes are
    /// left. Requires `Mode::Read`.
    #[cfg(feature = "alloc")]
    pub fn read<F: Flash>(&mut self, store: &mut Store<F>, len: usize) -> Result<Option<Vec<u8>>> {
        self.read_internal(store, len, false)
    }

    /// Read up to and including the next `\n` byte
    #[cfg(feature = "alloc")]
    pub fn read_line<F: Flash>(&mut self, store: &mut Store<F>) -> Result<Option<Vec<u8>>> {
        self.read_internal(store, 0, true)
    }

    /// Append `data` to the stream
    ///
    /// Fills the current chunk in place and allocates further chunks as
    /// needed, each pre-allocated to the full chunk capacity. Position
    /// state advances only after each successful sub-write, so a failed
    /// write leaves a partial chunk the next append-open scans past.
    /// Requires `Mode::Write` or `Mode::Append`.
    pub fn write<F: Flash>(&mut self, store: &mut Store<F>, mut data: &[u8]) -> Result<()> {
        match self.mode {
            Some(Mode::Write) | Some(Mode::Append) => {}
            Some(Mode::Read) => return Err(Error::WrongMode),
            None => return Err(Error::FileClosed),
        }
        if data.is_empty() {
            return Ok(());
        }
        self.revalidate(store)?;
        let chunk_size = store.geometry().chunk_size();
        loop {
            if self.addr == 0 {
                let n = data.len().min(chunk_size as usize);
                store.write_file(self.chunk_name(), &data[..n], FileFlags::empty(), 0, chunk_size)?;
                self.addr = self.resolve(store, self.chunk)?;
                self.offset = n as u32;
                data = &data[n..];
                if data.is_empty() {
                    return Ok(());
                }
            } else {
                let remaining = (chunk_size - self.offset) as usize;
                if data.len() < remaining {
                    store.write_file(
                        self.chunk_name(),
                        data,
                        FileFlags::empty(),
                        self.offset,
                        chunk_size,
                    )?;
                    self.offset += data.len() as u32;
                    return Ok(());
                }
                if remaining > 0 {
                    store.write_file(
                        self.chunk_name(),
                        &data[..remaining],
                        FileFlags::empty(),
                        self.offset,
                        chunk_size,
                    )?;
                    data = &data[remaining..];
                }
            }
            // current chunk is exactly full, move on to the next one
            if self.chunk == MAX_CHUNK {
                return Err(Error::FileTooBig);
            }
            self.chunk += 1;
            self.offset = 0;
            self.addr = 0;
        }
    }

    /// Erase every chunk of the stream and close the handle
    ///
    /// Walks chunk indices upward until one is absent; erasing more
    /// chunks than were ever written is harmless. Afterwards the handle
    /// rejects everything except another `erase`.
    pub fn erase<F: Flash>(&mut self, store: &mut Store<F>) -> Result<()> {
        for chunk in 1..=MAX_CHUNK {
            if !store.erase_file(self.base.with_chunk(chunk))? {
                break;
            }
        }
        self.chunk = 1;
        self.offset = 0;
        self.addr = 0;
        self.mode = None;
        Ok(())
    }
}

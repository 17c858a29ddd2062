//! Journal store: an append-only log of named records over raw flash
//!
//! The managed region is a linear journal of `(header, body, padding)`
//! triples. Records are only ever appended; replacing a file marks the
//! old record deleted and appends a fresh one, and the space is handed
//! back by [`Store::compact`]. The end of the journal is found by
//! scanning for a header slot that still carries the erased pattern.
//!
//! Records never span erase pages. When the tail of a page cannot hold
//! the next record the tail is abandoned and the record starts on the
//! following page boundary; the scan knows to look there.

mod header;

pub use self::header::{
    FileFlags, FileName, RecordHeader, HEADER_SIZE, NAME_LEN, STATUS_DELETED, STATUS_LIVE,
    WORD_ALIGN,
};

use self::header::{align_up, record_span, STATUS_OFFSET};
use crate::config::Geometry;
use crate::error::{Error, Result};
use crate::flash::{Flash, ERASED_BYTE};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Buffer size for blank checks and erased-range verification
const VERIFY_BUF: usize = 64;

/// How a record was found during a journal walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Status still carries the erased pattern
    Live,
    /// Status was explicitly cleared
    Deleted,
    /// Status was only partially programmed (interrupted write)
    Torn,
}

/// One journal entry as reported by [`Store::debug_files`]
#[derive(Debug, Clone, Copy)]
pub struct RecordInfo {
    /// Address of the record header
    pub addr: u32,
    /// Decoded header
    pub header: RecordHeader,
    /// Liveness classification
    pub state: RecordState,
}

/// A journaling file store owning a flash region
///
/// All mutation of the region goes through this value. Reads are
/// copy-on-read: the body is copied out of flash rather than borrowed,
/// so compaction cannot invalidate data already handed to the caller.
pub struct Store<F: Flash> {
    flash: F,
    geo: Geometry,
}

impl<F: Flash> Store<F> {
    /// Attach a store to `flash` over the region described by `geo`
    ///
    /// The region must fit inside the device. The journal is not
    /// scanned here; every operation scans on demand, which also acts
    /// as the reset-recovery pass (torn records read as deleted).
    pub fn new(flash: F, geo: Geometry) -> Result<Self> {
        if geo.end() as u64 > flash.size() as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(Self { flash, geo })
    }

    /// The region this store manages
    pub fn geometry(&self) -> &Geometry {
        &self.geo
    }

    /// Shared access to the underlying device (for inspection)
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Give the device back, consuming the store
    pub fn into_flash(self) -> F {
        self.flash
    }

    pub(crate) fn flash_read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.flash.read(addr, buf)
    }

    fn read_header(&mut self, addr: u32) -> Result<RecordHeader> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        self.flash.read(addr, &mut buf)?;
        Ok(RecordHeader::from_bytes(buf))
    }

    /// Walk every committed record from the journal base in address
    /// order. `visit` returns `false` to stop early. Returns the write
    /// pointer: the first usable erased slot (meaningless on early stop).
    fn walk<V: FnMut(u32, &RecordHeader) -> bool>(&mut self, mut visit: V) -> Result<u32> {
        let end = self.geo.end();
        let mut addr = self.geo.base();
        loop {
            if addr < end && self.geo.page_remaining(addr) < HEADER_SIZE {
                addr = self.geo.next_page(addr);
            }
            if addr >= end {
                return Ok(end);
            }
            let hdr = self.read_header(addr)?;
            if hdr.is_unwritten() {
                if self.geo.is_page_start(addr) {
                    return Ok(addr);
                }
                // Mid-page erased slot: either the true end of the
                // journal, or a tail abandoned because the next record
                // did not fit. The next page start disambiguates.
                let next = self.geo.next_page(addr);
                if next >= end {
                    return Ok(addr);
                }
                let peek = self.read_header(next)?;
                if peek.is_unwritten() {
                    return Ok(addr);
                }
                addr = next;
                continue;
            }
            // Guard against corrupt size fields: a valid record always
            // fits inside the page holding its header.
            let page_end = self.geo.next_page(addr) as u64;
            if addr as u64 + record_span(hdr.size) > page_end {
                log::debug!("journal: corrupt record at {:#x}, stopping scan", addr);
                return Ok(addr);
            }
            if !visit(addr, &hdr) {
                return Ok(addr);
            }
            addr += HEADER_SIZE + align_up(hdr.size);
        }
    }

    fn find_free(&mut self) -> Result<u32> {
        self.walk(|_, _| true)
    }

    /// Find the live record named `name`
    ///
    /// Returns the header address and the decoded header. Among
    /// multiple live candidates with the same name the one latest in
    /// the journal wins.
    pub fn find_file(&mut self, name: FileName) -> Result<Option<(u32, RecordHeader)>> {
        let mut found = None;
        self.walk(|addr, hdr| {
            if hdr.is_live() && hdr.name == name {
                found = Some((addr, *hdr));
            }
            true
        })?;
        Ok(found)
    }

    /// Read the live record named `name` into a fresh buffer
    #[cfg(feature = "alloc")]
    pub fn read_file(&mut self, name: FileName) -> Result<Option<Vec<u8>>> {
        let Some((addr, hdr)) = self.find_file(name)? else {
            return Ok(None);
        };
        let mut body = Vec::new();
        body.try_reserve_exact(hdr.size as usize)
            .map_err(|_| Error::NoMemory)?;
        body.resize(hdr.size as usize, 0);
        self.flash.read(addr + HEADER_SIZE, &mut body)?;
        Ok(Some(body))
    }

    /// Read the live record named `name` into `buf`
    ///
    /// `no_std` companion of [`Store::read_file`]. Fails with
    /// [`Error::BufferTooSmall`] if the body does not fit.
    pub fn read_file_into<'a>(
        &mut self,
        name: FileName,
        buf: &'a mut [u8],
    ) -> Result<Option<&'a [u8]>> {
        let Some((addr, hdr)) = self.find_file(name)? else {
            return Ok(None);
        };
        let len = hdr.size as usize;
        if buf.len() < len {
            return Err(Error::BufferTooSmall);
        }
        self.flash.read(addr + HEADER_SIZE, &mut buf[..len])?;
        Ok(Some(&buf[..len]))
    }

    /// Mark the live record named `name` deleted in place
    ///
    /// Returns `true` iff a live record existed. The record body stays
    /// on flash until the next [`Store::compact`] or [`Store::erase_all`].
    pub fn erase_file(&mut self, name: FileName) -> Result<bool> {
        let Some((addr, _)) = self.find_file(name)? else {
            return Ok(false);
        };
        log::debug!("journal: delete {} at {:#x}", name, addr);
        self.flash
            .write(addr + STATUS_OFFSET, &STATUS_DELETED.to_le_bytes())?;
        Ok(true)
    }

    /// Names of all live records, in journal order
    #[cfg(feature = "alloc")]
    pub fn list_files(&mut self) -> Result<Vec<FileName>> {
        let live = self.live_records()?;
        Ok(live.into_iter().map(|(_, hdr)| hdr.name).collect())
    }

    /// Bounded variant of [`Store::list_files`] for `no_std` callers
    ///
    /// Fails with [`Error::NoMemory`] when more than `MAX` live records
    /// exist.
    pub fn file_names<const MAX: usize>(&mut self) -> Result<heapless::Vec<FileName, MAX>> {
        let mut names: heapless::Vec<FileName, MAX> = heapless::Vec::new();
        let mut overflow = false;
        self.walk(|_, hdr| {
            if hdr.is_live() {
                if let Some(pos) = names.iter().position(|n| *n == hdr.name) {
                    names.remove(pos);
                }
                if names.push(hdr.name).is_err() {
                    overflow = true;
                    return false;
                }
            }
            true
        })?;
        if overflow {
            return Err(Error::NoMemory);
        }
        Ok(names)
    }

    /// Report every journal entry, including deleted and torn ones
    pub fn debug_files<V: FnMut(&RecordInfo)>(&mut self, mut visit: V) -> Result<()> {
        self.walk(|addr, hdr| {
            let state = if hdr.is_live() {
                RecordState::Live
            } else if hdr.is_deleted() {
                RecordState::Deleted
            } else {
                RecordState::Torn
            };
            visit(&RecordInfo {
                addr,
                header: *hdr,
                state,
            });
            true
        })?;
        Ok(())
    }

    /// Free bytes in the region
    ///
    /// With `conservative` set, returns the largest record body that a
    /// single [`Store::write_file`] can currently create. Otherwise
    /// returns the total erased bytes between the write pointer and the
    /// region end, which compaction may make writable.
    pub fn free_space(&mut self, conservative: bool) -> Result<u32> {
        let free = self.find_free()?;
        let end = self.geo.end();
        if free >= end {
            return Ok(0);
        }
        let tail = self.geo.next_page(free) - free;
        let whole_pages = (end - self.geo.next_page(free)) / self.geo.page_size();
        if conservative {
            Ok(if whole_pages > 0 {
                self.geo.chunk_size()
            } else {
                tail.saturating_sub(HEADER_SIZE)
            })
        } else {
            Ok(tail + whole_pages * self.geo.page_size())
        }
    }

    fn is_page_blank(&mut self, page_addr: u32) -> Result<bool> {
        let mut buf = [0u8; VERIFY_BUF];
        let mut off = 0;
        while off < self.geo.page_size() {
            let n = VERIFY_BUF.min((self.geo.page_size() - off) as usize);
            self.flash.read(page_addr + off, &mut buf[..n])?;
            if buf[..n].iter().any(|&b| b != ERASED_BYTE) {
                return Ok(false);
            }
            off += n as u32;
        }
        Ok(true)
    }

    /// Erase every page in the region, skipping pages that are already
    /// blank to save erase cycles
    pub fn erase_all(&mut self) -> Result<()> {
        for page in 0..self.geo.page_count() {
            let addr = self.geo.base() + page * self.geo.page_size();
            if !self.is_page_blank(addr)? {
                self.flash.erase_page(addr)?;
            }
        }
        Ok(())
    }

    fn verify_erased(&mut self, addr: u32, len: u32) -> Result<()> {
        let mut buf = [0u8; VERIFY_BUF];
        let mut off = 0;
        while off < len {
            let n = VERIFY_BUF.min((len - off) as usize);
            self.flash.read(addr + off, &mut buf[..n])?;
            if buf[..n].iter().any(|&b| b != ERASED_BYTE) {
                return Err(Error::NotErased);
            }
            off += n as u32;
        }
        Ok(())
    }

    /// Append a record at the write pointer. `data.len() <= total_size`
    /// must hold; the body tail past `data` stays erased.
    fn create_record(
        &mut self,
        name: FileName,
        data: &[u8],
        flags: FileFlags,
        total_size: u32,
    ) -> Result<u32> {
        let span = HEADER_SIZE + align_up(total_size);
        let mut addr = self.find_free()?;
        if addr < self.geo.end() && self.geo.page_remaining(addr) < span {
            // does not fit in the current page tail, skip to the next page
            addr = self.geo.next_page(addr);
        }
        if addr as u64 + span as u64 > self.geo.end() as u64 {
            return Err(Error::NoSpace);
        }
        self.verify_erased(addr, span)?;
        let hdr = RecordHeader::new(name, total_size, flags);
        self.flash.write(addr, &hdr.to_bytes())?;
        if !data.is_empty() {
            self.flash.write(addr + HEADER_SIZE, data)?;
        }
        log::debug!(
            "journal: create {} at {:#x}, {} of {} bytes",
            name,
            addr,
            data.len(),
            total_size
        );
        Ok(addr)
    }

    /// Create, replace or fill a record
    ///
    /// With `total_size` non-zero a record of that body length is
    /// reserved and `data` lands at `offset` inside it; the remaining
    /// bytes stay erased for later calls. With `total_size` zero the
    /// body is exactly `data` and `offset` selects between creating a
    /// fresh record (`0`) and filling a pre-allocated one (`> 0`).
    ///
    /// Filling requires the existing record to have the declared size
    /// and the target range to still be erased; a full overwrite is
    /// expressed as mark-deleted plus append, so the journal never
    /// holds two live records with one name.
    pub fn write_file(
        &mut self,
        name: FileName,
        data: &[u8],
        flags: FileFlags,
        offset: u32,
        total_size: u32,
    ) -> Result<()> {
        let data_len = u32::try_from(data.len()).map_err(|_| Error::NoSpace)?;

        let existing = self.find_file(name)?;
        if let Some((addr, hdr)) = existing {
            let fill = offset > 0 || (total_size > 0 && total_size == hdr.size);
            if fill {
                if total_size != 0 && total_size != hdr.size {
                    return Err(Error::SizeMismatch);
                }
                let end_off = offset.checked_add(data_len).ok_or(Error::InvalidOffset)?;
                if end_off > hdr.size {
                    return Err(Error::InvalidOffset);
                }
                let body = addr + HEADER_SIZE;
                self.verify_erased(body + offset, data_len)?;
                if !data.is_empty() {
                    self.flash.write(body + offset, data)?;
                }
                log::trace!(
                    "journal: fill {} at {:#x}+{}, {} bytes",
                    name,
                    addr,
                    offset,
                    data_len
                );
                return Ok(());
            }
        } else if offset != 0 {
            // nothing to fill into
            return Err(Error::InvalidOffset);
        }

        let size = if total_size > 0 { total_size } else { data_len };
        if data_len > size {
            return Err(Error::SizeMismatch);
        }
        if size > self.geo.chunk_size() {
            return Err(Error::NoSpace);
        }
        // Make sure the replacement fits before superseding the old
        // record; appending does not reclaim the old one's space.
        let span = HEADER_SIZE + align_up(size);
        let mut place = self.find_free()?;
        if place < self.geo.end() && self.geo.page_remaining(place) < span {
            place = self.geo.next_page(place);
        }
        if place as u64 + span as u64 > self.geo.end() as u64 {
            return Err(Error::NoSpace);
        }
        if let Some((addr, _)) = existing {
            self.flash
                .write(addr + STATUS_OFFSET, &STATUS_DELETED.to_le_bytes())?;
        }
        self.create_record(name, data, flags, size)?;
        Ok(())
    }

    /// Live records in journal order, latest record winning per name
    #[cfg(feature = "alloc")]
    fn live_records(&mut self) -> Result<Vec<(u32, RecordHeader)>> {
        let mut live: Vec<(u32, RecordHeader)> = Vec::new();
        self.walk(|addr, hdr| {
            if hdr.is_live() {
                if let Some(pos) = live.iter().position(|(_, h)| h.name == hdr.name) {
                    live.remove(pos);
                }
                live.push((addr, *hdr));
            }
            true
        })?;
        Ok(live)
    }

    /// Rewrite the journal, dropping superseded and deleted records
    ///
    /// Two-phase: every live body is staged to RAM first, then the
    /// region is erased and the records are replayed in journal order.
    /// The staging phase uses fallible allocation; on [`Error::NoMemory`]
    /// the flash is untouched. A reset between erase and replay loses
    /// the records that were not yet replayed, as the staging copy only
    /// lives in RAM.
    ///
    /// Any address previously obtained through [`Store::find_file`] is
    /// stale afterwards and must be re-resolved by name.
    #[cfg(feature = "alloc")]
    pub fn compact(&mut self) -> Result<()> {
        struct Staged {
            header: RecordHeader,
            body: Vec<u8>,
        }

        let live = self.live_records()?;
        let mut staged: Vec<Staged> = Vec::new();
        staged
            .try_reserve_exact(live.len())
            .map_err(|_| Error::NoMemory)?;
        for (addr, hdr) in live {
            let mut body = Vec::new();
            body.try_reserve_exact(hdr.size as usize)
                .map_err(|_| Error::NoMemory)?;
            body.resize(hdr.size as usize, 0);
            self.flash.read(addr + HEADER_SIZE, &mut body)?;
            staged.push(Staged { header: hdr, body });
        }
        log::debug!("journal: compacting {} live records", staged.len());
        self.erase_all()?;
        for rec in &staged {
            self.create_record(rec.header.name, &rec.body, rec.header.flags(), rec.header.size)?;
        }
        Ok(())
    }
}

//! Journal store integration tests over the in-memory flash

use flashstore_core::config::Geometry;
use flashstore_core::error::Error;
use flashstore_core::store::{FileFlags, FileName, RecordState, Store};
use flashstore_memflash::{MemConfig, MemFlash};

fn store(page_size: u32, pages: u32) -> Store<MemFlash> {
    let size = page_size * pages;
    let flash = MemFlash::new(MemConfig {
        size: size as usize,
        page_size: page_size as usize,
    });
    Store::new(flash, Geometry::new(0, size, page_size).unwrap()).unwrap()
}

fn name(s: &str) -> FileName {
    FileName::try_from(s).unwrap()
}

fn write(store: &mut Store<MemFlash>, n: &str, data: &[u8]) {
    store
        .write_file(name(n), data, FileFlags::empty(), 0, 0)
        .unwrap();
}

#[test]
fn simple_write_read() {
    let mut s = store(4096, 4);
    write(&mut s, "hello", b"Hi");
    assert_eq!(s.read_file(name("hello")).unwrap().unwrap(), b"Hi");
    assert_eq!(s.list_files().unwrap(), vec![name("hello")]);
}

#[test]
fn missing_file_reads_nothing() {
    let mut s = store(4096, 4);
    assert_eq!(s.read_file(name("nope")).unwrap(), None);
    assert_eq!(s.find_file(name("nope")).unwrap(), None);
    assert!(!s.erase_file(name("nope")).unwrap());
}

#[test]
fn preallocated_partial_fill() {
    let mut s = store(4096, 4);
    let a = name("a");
    s.write_file(a, b"Hello", FileFlags::empty(), 0, 14).unwrap();
    s.write_file(a, b" ", FileFlags::empty(), 5, 0).unwrap();
    s.write_file(a, b"World!!!", FileFlags::empty(), 6, 0).unwrap();
    assert_eq!(s.read_file(a).unwrap().unwrap(), b"Hello World!!!");
}

#[test]
fn partial_fill_requires_erased_target() {
    let mut s = store(4096, 4);
    let a = name("a");
    s.write_file(a, b"Hello", FileFlags::empty(), 0, 14).unwrap();
    // same declared size routes to the fill path, which must reject
    // programming over existing data
    assert_eq!(
        s.write_file(a, b"Howdy", FileFlags::empty(), 0, 14)
            .unwrap_err(),
        Error::NotErased
    );
    assert_eq!(
        s.write_file(a, b"x", FileFlags::empty(), 2, 0).unwrap_err(),
        Error::NotErased
    );
    // untouched range is still fine
    s.write_file(a, b"!", FileFlags::empty(), 13, 0).unwrap();
}

#[test]
fn partial_fill_size_and_bounds_checks() {
    let mut s = store(4096, 4);
    let a = name("a");
    s.write_file(a, b"1234", FileFlags::empty(), 0, 14).unwrap();
    assert_eq!(
        s.write_file(a, b"x", FileFlags::empty(), 5, 10).unwrap_err(),
        Error::SizeMismatch
    );
    assert_eq!(
        s.write_file(a, b"xx", FileFlags::empty(), 13, 0).unwrap_err(),
        Error::InvalidOffset
    );
    // filling a file that does not exist
    assert_eq!(
        s.write_file(name("b"), b"x", FileFlags::empty(), 3, 0)
            .unwrap_err(),
        Error::InvalidOffset
    );
}

#[test]
fn supersede_keeps_one_live_record() {
    let mut s = store(4096, 4);
    let a = name("a");
    write(&mut s, "a", b"one");
    write(&mut s, "a", b"two");
    assert_eq!(s.read_file(a).unwrap().unwrap(), b"two");
    assert_eq!(s.list_files().unwrap(), vec![a]);

    // the superseded record is still on flash, marked deleted
    let mut states = Vec::new();
    s.debug_files(|rec| states.push((rec.header.name, rec.state)))
        .unwrap();
    assert_eq!(
        states,
        vec![(a, RecordState::Deleted), (a, RecordState::Live)]
    );

    // compaction drops the garbage
    s.compact().unwrap();
    let mut count = 0;
    s.debug_files(|_| count += 1).unwrap();
    assert_eq!(count, 1);
    assert_eq!(s.read_file(a).unwrap().unwrap(), b"two");
}

#[test]
fn erase_file_marks_deleted() {
    let mut s = store(4096, 4);
    write(&mut s, "a", b"data");
    assert!(s.erase_file(name("a")).unwrap());
    assert_eq!(s.read_file(name("a")).unwrap(), None);
    assert!(s.list_files().unwrap().is_empty());
    assert!(!s.erase_file(name("a")).unwrap());
}

#[test]
fn erase_all_wipes_everything() {
    let mut s = store(4096, 4);
    write(&mut s, "a", b"data");
    write(&mut s, "b", b"more");
    s.erase_all().unwrap();
    assert_eq!(s.read_file(name("a")).unwrap(), None);
    assert!(s.list_files().unwrap().is_empty());
    assert_eq!(s.free_space(false).unwrap(), 4 * 4096);
}

#[test]
fn erase_all_skips_blank_pages() {
    let mut s = store(4096, 4);
    s.erase_all().unwrap();
    assert_eq!(s.flash().erase_count, 0);

    write(&mut s, "a", b"data");
    s.erase_all().unwrap();
    // only the first page ever carried data
    assert_eq!(s.flash().erase_count, 1);
}

#[test]
fn free_space_accounting() {
    let mut s = store(64, 4);
    // chunk capacity is page minus header
    assert_eq!(s.free_space(true).unwrap(), 48);
    assert_eq!(s.free_space(false).unwrap(), 256);

    write(&mut s, "a", b"0123456789"); // span 16 + 12
    assert_eq!(s.free_space(false).unwrap(), 256 - 28);
    // whole pages remain, so a full-size body still fits
    assert_eq!(s.free_space(true).unwrap(), 48);
}

#[test]
fn journaling_never_erases_until_compact() {
    let mut s = store(4096, 4);
    write(&mut s, "a", b"one");
    write(&mut s, "a", b"two");
    write(&mut s, "a", b"three");
    s.erase_file(name("a")).unwrap();
    assert_eq!(s.flash().erase_count, 0);
    s.compact().unwrap();
    assert!(s.flash().erase_count >= 1);
}

#[test]
fn compact_is_idempotent_and_frees_space() {
    let mut s = store(64, 8);
    write(&mut s, "a", b"aaaaaaaaaa");
    write(&mut s, "a", b"bbbbbbbbbb");
    write(&mut s, "keep", b"kkkk");
    s.erase_file(name("keep")).unwrap();
    write(&mut s, "keep", b"k2");

    let before = s.free_space(false).unwrap();
    s.compact().unwrap();
    let after = s.free_space(false).unwrap();
    assert!(after >= before);
    assert_eq!(s.read_file(name("a")).unwrap().unwrap(), b"bbbbbbbbbb");
    assert_eq!(s.read_file(name("keep")).unwrap().unwrap(), b"k2");

    let snapshot = s.flash().data().to_vec();
    s.compact().unwrap();
    assert_eq!(s.flash().data(), &snapshot[..]);
}

#[test]
fn no_space_reported_cleanly() {
    let mut s = store(64, 1);
    // a body can never exceed the chunk capacity
    assert_eq!(
        s.write_file(name("big"), &[0u8; 49], FileFlags::empty(), 0, 0)
            .unwrap_err(),
        Error::NoSpace
    );
    write(&mut s, "a", &[1u8; 20]);
    assert_eq!(
        s.write_file(name("b"), &[2u8; 20], FileFlags::empty(), 0, 0)
            .unwrap_err(),
        Error::NoSpace
    );
    // the failed write left nothing behind
    assert_eq!(s.list_files().unwrap(), vec![name("a")]);
}

#[test]
fn failed_supersede_keeps_the_old_record() {
    let mut s = store(64, 1);
    write(&mut s, "a", &[1u8; 20]);
    // replacement does not fit; the live record must survive
    assert_eq!(
        s.write_file(name("a"), &[2u8; 30], FileFlags::empty(), 0, 0)
            .unwrap_err(),
        Error::NoSpace
    );
    assert_eq!(s.read_file(name("a")).unwrap().unwrap(), &[1u8; 20][..]);
}

#[test]
fn record_skips_abandoned_page_tail() {
    let mut s = store(64, 2);
    write(&mut s, "a", &[1u8; 20]); // ends at 36, tail of 28 bytes left
    write(&mut s, "b", &[2u8; 30]); // span 48 > 28, lands on page 2
    assert_eq!(s.list_files().unwrap(), vec![name("a"), name("b")]);
    assert_eq!(s.read_file(name("b")).unwrap().unwrap(), &[2u8; 30][..]);

    let (addr_b, _) = s.find_file(name("b")).unwrap().unwrap();
    assert_eq!(addr_b, 64);
    // nothing writable is left: page 2 holds 16 bytes of tail
    assert_eq!(s.free_space(false).unwrap(), 16);
    assert_eq!(s.free_space(true).unwrap(), 0);
}

#[test]
fn torn_status_reads_as_deleted() {
    let mut s = store(4096, 4);
    write(&mut s, "a", b"hi");
    let (addr, _) = s.find_file(name("a")).unwrap().unwrap();

    // simulate a reset that interrupted the status programming
    let mut flash = s.into_flash();
    flash.data_mut()[addr as usize + 14] = 0xFF;
    flash.data_mut()[addr as usize + 15] = 0x00;
    let mut s = Store::new(flash, Geometry::new(0, 4 * 4096, 4096).unwrap()).unwrap();

    assert_eq!(s.find_file(name("a")).unwrap(), None);
    assert!(s.list_files().unwrap().is_empty());
    let mut states = Vec::new();
    s.debug_files(|rec| states.push(rec.state)).unwrap();
    assert_eq!(states, vec![RecordState::Torn]);

    // the name is free for reuse
    write(&mut s, "a", b"new");
    assert_eq!(s.read_file(name("a")).unwrap().unwrap(), b"new");
}

#[test]
fn list_order_is_journal_order() {
    let mut s = store(4096, 4);
    write(&mut s, "a", b"1");
    write(&mut s, "b", b"2");
    write(&mut s, "c", b"3");
    write(&mut s, "b", b"2b"); // superseding moves b to the journal tail
    assert_eq!(
        s.list_files().unwrap(),
        vec![name("a"), name("c"), name("b")]
    );
}

#[test]
fn read_file_into_buffer() {
    let mut s = store(4096, 4);
    write(&mut s, "a", b"abcdef");
    let mut buf = [0u8; 16];
    assert_eq!(
        s.read_file_into(name("a"), &mut buf).unwrap().unwrap(),
        b"abcdef"
    );
    let mut small = [0u8; 3];
    assert_eq!(
        s.read_file_into(name("a"), &mut small).unwrap_err(),
        Error::BufferTooSmall
    );
}

#[test]
fn bounded_name_listing() {
    let mut s = store(4096, 4);
    write(&mut s, "a", b"1");
    write(&mut s, "b", b"2");
    write(&mut s, "c", b"3");
    let names = s.file_names::<8>().unwrap();
    assert_eq!(names.len(), 3);
    assert_eq!(
        s.file_names::<2>().unwrap_err(),
        Error::NoMemory
    );
}

#[test]
fn flags_survive_round_trip() {
    let mut s = store(4096, 4);
    s.write_file(name("z"), b"zz", FileFlags::COMPRESSED, 0, 0)
        .unwrap();
    let (_, hdr) = s.find_file(name("z")).unwrap().unwrap();
    assert_eq!(hdr.flags(), FileFlags::COMPRESSED);
}

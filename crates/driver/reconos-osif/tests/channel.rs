//! Channel open/read/write/close against the simulated system.

mod common;

use common::Sim;
use reconos_osif::OsifError;

#[test]
fn words_arrive_in_fifo_order() {
    let sim = Sim::new(2);
    let osif = sim.boot();
    sim.hw_push(1, &[0x11, 0x22, 0x33, 0x44]);

    let ch = osif.open(1).unwrap();
    let got: Vec<u32> = (0..4).map(|_| ch.read()).collect();
    assert_eq!(got, [0x11, 0x22, 0x33, 0x44]);
}

#[test]
fn cached_fill_counts_down_from_last_refresh() {
    let sim = Sim::new(1);
    let osif = sim.boot();
    sim.hw_push(0, &[1, 2, 3]);
    let ch = osif.open(0).unwrap();

    assert_eq!(ch.read(), 1);
    assert_eq!(ch.cached_fill(), 2);

    // Words arriving after the refresh are not seen until the cache runs dry.
    sim.hw_push(0, &[4, 5]);
    assert_eq!(ch.read(), 2);
    assert_eq!(osif.cached_fill(0), Ok(1));
    assert_eq!(ch.read(), 3);
    assert_eq!(ch.cached_fill(), 0);

    assert_eq!(ch.read(), 4);
    assert_eq!(ch.cached_fill(), 1);
}

#[test]
fn reads_with_data_present_never_arm() {
    let sim = Sim::new(4);
    let osif = sim.boot();
    sim.hw_push(2, &[7; 5]);

    let ch = osif.open(2).unwrap();
    for _ in 0..5 {
        assert_eq!(ch.read(), 7);
    }
    assert_eq!(osif.enable_mask(), 0);
    assert_eq!(sim.state().enable_writes, [0]);
}

#[test]
fn non_empty_status_with_zero_fill_yields_one_word() {
    let sim = Sim::new(1);
    let osif = sim.boot();
    sim.hw_push(0, &[9, 10]);
    sim.state().recv_status_override[0] = Some(0);

    let ch = osif.open(0).unwrap();
    assert_eq!(ch.read(), 9);
    assert_eq!(ch.cached_fill(), 0);
    assert_eq!(ch.read(), 10);
}

#[test]
fn open_rejects_out_of_range_ids() {
    let sim = Sim::new(5);
    let osif = sim.boot();

    assert_eq!(osif.open(5).err(), Some(OsifError::InvalidChannel));
    assert_eq!(osif.open(-1).err(), Some(OsifError::InvalidChannel));
    assert_eq!(osif.open(usize::MAX).err(), Some(OsifError::InvalidChannel));
    assert_eq!(osif.open(4).map(|ch| ch.id()), Ok(4));
    assert_eq!(osif.cached_fill(5), Err(OsifError::InvalidChannel));
}

#[test]
fn open_touches_no_hardware() {
    let sim = Sim::new(3);
    let osif = sim.boot();
    let before = sim.state().enable_writes.len();

    let ch = osif.open(2).unwrap();
    ch.close();

    assert_eq!(sim.state().enable_writes.len(), before);
    assert!(sim.hw_received(2).is_empty());
}

#[test]
fn close_keeps_buffered_words() {
    let sim = Sim::new(1);
    let osif = sim.boot();
    sim.hw_push(0, &[1, 2]);

    let ch = osif.open(0).unwrap();
    assert_eq!(ch.read(), 1);
    ch.close();

    let ch = osif.open(0).unwrap();
    assert_eq!(ch.read(), 2);
}

#[test]
fn write_reaches_hwt() {
    let sim = Sim::new(2);
    let osif = sim.boot();

    let ch = osif.open(1).unwrap();
    ch.write(0xCAFE);
    ch.write(0xF00D);

    assert_eq!(sim.hw_received(1), [0xCAFE, 0xF00D]);
    assert!(sim.hw_received(0).is_empty());
}

#[test]
fn write_waits_while_send_fifo_full() {
    let sim = Sim::new(1);
    let osif = sim.boot();
    sim.state().full_polls[0] = 10;

    osif.open(0).unwrap().write(42);

    assert_eq!(sim.state().full_polls[0], 0);
    assert_eq!(sim.hw_received(0), [42]);
}

mod common;

use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use common::mac;
use recon_oxide::targets::TargetDirectory;
use recon_oxide::HardwareAddress;

#[test]
fn test_first_seen_is_fixed_and_last_seen_follows() {
    let directory = TargetDirectory::new();
    let address = mac("00:11:22:33:44:55");
    let start = Utc::now();

    for step in 0..5 {
        let seen = start + Duration::seconds(step);
        directory.add_if_new_at("lab", address, true, 1, seen);
        let entry = directory.get(&address).unwrap();
        assert_eq!(entry.endpoint.first_seen(), start);
        assert_eq!(entry.endpoint.last_seen(), seen);
    }
}

#[test]
fn test_last_seen_never_goes_back() {
    let directory = TargetDirectory::new();
    let address = mac("00:11:22:33:44:55");
    let now = Utc::now();

    directory.add_if_new_at("", address, false, 1, now);
    directory.add_if_new_at("", address, false, 1, now - Duration::seconds(30));
    assert_eq!(directory.get(&address).unwrap().endpoint.last_seen(), now);
}

#[test]
fn test_size_grows_only_for_new_addresses() {
    let directory = TargetDirectory::new();
    assert!(directory.add_if_new("", mac("00:00:00:00:00:01"), false, 1));
    assert_eq!(directory.len(), 1);
    assert!(directory.add_if_new("", mac("00:00:00:00:00:02"), false, 1));
    assert_eq!(directory.len(), 2);
    assert!(!directory.add_if_new("", mac("00:00:00:00:00:01"), false, 6));
    assert_eq!(directory.len(), 2);
}

#[test]
fn test_base_station_keeps_ssid_and_client_upgrades() {
    let directory = TargetDirectory::new();
    let station = mac("00:11:22:33:44:55");
    directory.add_if_new("first", station, true, 1);
    directory.add_if_new("second", station, true, 1);
    directory.add_if_new("", station, false, 1);
    let entry = directory.get(&station).unwrap();
    assert_eq!(entry.ssid(), "first");
    assert!(entry.is_base_station());

    let client = mac("66:77:88:99:aa:bb");
    directory.add_if_new("", client, false, 1);
    directory.add_if_new("mesh", client, true, 1);
    let entry = directory.get(&client).unwrap();
    assert!(entry.is_base_station());
    assert_eq!(entry.ssid(), "mesh");
}

#[test]
fn test_clear_all_empties_everything() {
    let directory = TargetDirectory::new();
    for last in 0..20u8 {
        directory.add_if_new("", HardwareAddress([0x02, 0, 0, 0, 0, last]), false, 1);
    }
    directory.clear_all();
    assert!(directory.list().is_empty());
    assert!(directory.is_empty());

    TargetDirectory::new().clear_all();
}

#[test]
fn test_concurrent_writers_and_readers() {
    let directory = Arc::new(TargetDirectory::new());

    let writers: Vec<_> = (0..4u8)
        .map(|thread_id| {
            let directory = directory.clone();
            thread::spawn(move || {
                for last in 0..50u8 {
                    directory.add_if_new("", HardwareAddress([0x02, 0, 0, 0, thread_id, last]), false, 1);
                }
            })
        })
        .collect();

    let reader = {
        let directory = directory.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                let entries = directory.list();
                let mut addresses: Vec<_> = entries.iter().map(|entry| entry.address()).collect();
                addresses.sort();
                addresses.dedup();
                assert_eq!(addresses.len(), entries.len());
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();
    assert_eq!(directory.len(), 200);
}

#[test]
fn test_clear_during_writes_leaves_a_consistent_directory() {
    let directory = Arc::new(TargetDirectory::new());
    let writer = {
        let directory = directory.clone();
        thread::spawn(move || {
            for last in 0..=255u8 {
                directory.add_if_new("", HardwareAddress([0x02, 0, 0, 0, 1, last]), false, 1);
            }
        })
    };
    for _ in 0..10 {
        directory.clear_all();
    }
    writer.join().unwrap();

    // Whatever survived was added after the last clear, each address once.
    let entries = directory.list();
    assert_eq!(entries.len(), directory.len());
    directory.clear_all();
    assert!(directory.list().is_empty());
}

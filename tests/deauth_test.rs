mod common;

use std::time::Duration;

use common::{mac, RecordingInjector};
use recon_oxide::attack::{send_deauth, send_deauth_packet};
use recon_oxide::frame::{decode, Dot11Frame, LinkType, ManagementSubtype};
use recon_oxide::targets::{AttackTarget, TargetDirectory};
use recon_oxide::{HardwareAddress, ReconError};

/// (destination, source, bssid, sequence) of an injected deauth.
fn addressing(frame: &[u8]) -> (HardwareAddress, HardwareAddress, HardwareAddress, u16) {
    // Skip the 10 byte tx radiotap header.
    let decoded = decode(LinkType::IEEE802_11, &frame[10..]).expect("injected frame decodes");
    match decoded.frame {
        Dot11Frame::Management(management) => {
            assert_eq!(management.subtype, ManagementSubtype::Deauthentication);
            let header = management.header;
            (
                header.address_1,
                header.address_2,
                header.address_3,
                header.sequence_control.sequence_number,
            )
        }
        other => panic!("expected a deauth, got {other:?}"),
    }
}

#[test]
fn test_single_pair_sends_128_alternating_frames() {
    let bs = mac("00:11:22:33:44:55");
    let client = mac("66:77:88:99:aa:bb");
    let mut injector = RecordingInjector::new();
    let frames = injector.frames.clone();

    assert_eq!(send_deauth_packet(&mut injector, &bs, &client), 128);

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 128);
    for (index, (_, frame)) in frames.iter().enumerate() {
        let sequence = (index / 2) as u16;
        // Reason code: class 2 frame from a nonauthenticated station.
        assert_eq!(&frame[frame.len() - 2..], &[0x06, 0x00]);
        if index % 2 == 0 {
            assert_eq!(addressing(frame), (client, bs, bs, sequence));
        } else {
            assert_eq!(addressing(frame), (bs, client, bs, sequence));
        }
    }

    // Every frame is followed by a 2 ms pause.
    let elapsed = frames[127].0 - frames[0].0;
    assert!(elapsed >= Duration::from_millis(2 * 127), "{elapsed:?}");
    for pair in frames.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(2));
    }
}

#[test]
fn test_dispatch_with_client_hits_only_that_pair() {
    let bs = mac("00:11:22:33:44:55");
    let client = mac("66:77:88:99:aa:bb");
    let directory = TargetDirectory::new();
    directory.add_if_new("", mac("66:77:88:99:aa:01"), false, 1);
    directory.add_if_new("", mac("66:77:88:99:aa:02"), false, 1);

    let mut injector = RecordingInjector::new();
    let summary = send_deauth(
        &mut injector,
        &AttackTarget::new(Some(bs), Some(client)),
        &directory,
    )
    .unwrap();

    assert_eq!(summary.pairs, vec![(bs, client)]);
    assert_eq!(summary.frames, 128);
    assert!(!summary.aborted());
    assert_eq!(injector.frames.lock().unwrap().len(), 128);
}

#[test]
fn test_dispatch_sweeps_every_entry() {
    let bs = mac("00:11:22:33:44:55");
    let directory = TargetDirectory::new();
    let clients = [
        mac("66:77:88:99:aa:01"),
        mac("66:77:88:99:aa:02"),
        mac("66:77:88:99:aa:03"),
    ];
    for client in clients {
        directory.add_if_new("", client, false, 6);
    }

    let mut injector = RecordingInjector::new();
    let summary = send_deauth(&mut injector, &AttackTarget::new(Some(bs), None), &directory).unwrap();

    assert_eq!(summary.pairs.len(), 3);
    assert_eq!(summary.frames, 3 * 128);
    let mut hit: Vec<_> = summary.pairs.iter().map(|(_, client)| *client).collect();
    hit.sort();
    assert_eq!(hit, clients);

    let frames = injector.frames.lock().unwrap();
    assert_eq!(frames.len(), 3 * 128);
    // Each block of 128 targets exactly one client.
    for block in frames.chunks(128) {
        let (destination, _, _, _) = addressing(&block[0].1);
        assert!(block
            .iter()
            .step_by(2)
            .all(|(_, frame)| addressing(frame).0 == destination));
    }
}

#[test]
fn test_dispatch_sweep_with_empty_directory_sends_nothing() {
    let mut injector = RecordingInjector::new();
    let summary = send_deauth(
        &mut injector,
        &AttackTarget::new(Some(mac("00:11:22:33:44:55")), None),
        &TargetDirectory::new(),
    )
    .unwrap();
    assert!(summary.pairs.is_empty());
    assert_eq!(injector.frames.lock().unwrap().len(), 0);
}

#[test]
fn test_dispatch_without_base_station_fails() {
    let directory = TargetDirectory::new();
    directory.add_if_new("", mac("66:77:88:99:aa:01"), false, 1);
    let mut injector = RecordingInjector::new();

    let result = send_deauth(&mut injector, &AttackTarget::default(), &directory);
    assert_eq!(result, Err(ReconError::NoBaseStationConfigured));
    assert_eq!(injector.frames.lock().unwrap().len(), 0);
}

use crate::engine::BmcaCoordinator;
use crate::port::tests::{announce_from, listening_port, master_identity};
use crate::port::PortState;
use crate::time::Timestamp;
use crate::types::PtpConfig;

fn secs(s: u64) -> Timestamp {
    Timestamp::from_secs(s)
}

#[test]
fn test_respects_interval() {
    let mut coordinator = BmcaCoordinator::new();
    let mut port = listening_port(PtpConfig::default());
    coordinator.tick(&mut port, secs(1));
    coordinator.tick(&mut port, Timestamp::from_millis(1_500));
    assert_eq!(coordinator.executions, 1);
    coordinator.tick(&mut port, secs(2));
    assert_eq!(coordinator.executions, 2);
}

#[test]
fn test_counts_no_foreign_masters() {
    let mut coordinator = BmcaCoordinator::new();
    let mut port = listening_port(PtpConfig::default());
    coordinator.tick(&mut port, secs(1));
    assert_eq!(coordinator.no_foreign_masters, 1);
    assert_eq!(port.state(), PortState::Listening);
}

#[test]
fn test_records_slave_selection_and_role_change() {
    let mut coordinator = BmcaCoordinator::new();
    let mut port = listening_port(PtpConfig::default());
    // Seed the table without letting the announce path elect (the
    // announce itself runs BMCA, so the role change happens there; the
    // coordinator still records the selection outcome).
    port.process_message(&announce_from(master_identity(), 64, 0), secs(1))
        .unwrap();
    coordinator.tick(&mut port, secs(2));
    assert_eq!(coordinator.executions, 1);
    assert_eq!(coordinator.slave_selections, 1);
}

#[test]
fn test_better_master_between_runs_keeps_slave_selection() {
    let mut coordinator = BmcaCoordinator::new();
    let mut port = listening_port(PtpConfig::default());
    port.process_message(&announce_from(master_identity(), 64, 0), secs(1))
        .unwrap();
    coordinator.tick(&mut port, secs(2));
    assert_eq!(coordinator.parent_changes, 0);

    // A better master appears between coordinator runs; the announce
    // path adopts it immediately and the next run records the outcome.
    let better = crate::types::PortIdentity::new(crate::types::ClockIdentity([0x42; 8]), 1);
    port.process_message(&announce_from(better, 32, 0), secs(2))
        .unwrap();
    assert_eq!(port.parent_data_set().parent_port_identity, better);
    coordinator.tick(&mut port, secs(3));
    assert_eq!(coordinator.slave_selections, 2);
}

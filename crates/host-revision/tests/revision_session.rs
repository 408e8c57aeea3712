//! End-to-end revision sessions against an in-memory host.

mod common;

use std::time::Duration;

use common::{sector, Harness, CONTRACT_ID, HEIGHT, WINDOW_START};
use host_revision::application::{read_object, write_object};
use host_revision::{
    insert_delta, ConnError, HostSettings, Modification, ModificationError, NegotiationConn,
    RevisionConfig, RevisionError, SessionError, SessionOutcome, SignedSettings, SigningError,
    TESTING_SECTOR_SIZE,
};
use shared_types::{contract_root, sector_root, CoveredFields, Currency};

#[tokio::test]
async fn test_append_sector_to_five() {
    let harness = Harness::new(5, RevisionConfig::for_testing());
    let (mut renter, handle) = harness.connect();

    let recent = renter.open().await.unwrap();
    assert_eq!(recent.revision.revision_number, 1);
    assert_eq!(recent.signatures.len(), 2);

    renter
        .run_round(vec![Modification::Insert {
            index: 5,
            data: sector(0xAA),
        }])
        .await
        .unwrap();
    renter.stop().await.unwrap();

    assert_eq!(
        handle.await.unwrap().unwrap(),
        SessionOutcome::Stopped { rounds: 1 }
    );

    let so = harness.obligation();
    assert_eq!(so.sector_roots.len(), 6);
    assert_eq!(so.sector_roots[5], sector_root(&sector(0xAA)));
    assert_eq!(so.revision.revision_number, 2);
    assert_eq!(so.revision.file_size, 6 * TESTING_SECTOR_SIZE);
    assert_eq!(so.revision.file_merkle_root, contract_root(&so.sector_roots));
    assert!(so.revision_transaction().standalone_valid(HEIGHT).is_ok());

    let expected = insert_delta(&HostSettings::for_testing(), WINDOW_START - HEIGHT).unwrap();
    assert_eq!(so.anticipated_revenue, expected.storage_revenue);
    assert_eq!(so.confirmed_revenue, expected.bandwidth_revenue);
    assert_eq!(so.risked_collateral, expected.collateral_risked);
    assert_eq!(
        so.revision.host_payout,
        expected.storage_revenue + expected.bandwidth_revenue
    );
    assert!(!harness.service.locker().is_locked(&CONTRACT_ID));
}

#[tokio::test]
async fn test_delete_middle_sector() {
    let harness = Harness::new(3, RevisionConfig::for_testing());
    let before = harness.obligation().sector_roots;
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    renter
        .run_round(vec![Modification::Delete { index: 1 }])
        .await
        .unwrap();
    renter.stop().await.unwrap();
    handle.await.unwrap().unwrap();

    let so = harness.obligation();
    assert_eq!(so.sector_roots, vec![before[0], before[2]]);
    assert_eq!(so.revision.file_size, 2 * TESTING_SECTOR_SIZE);
    assert_eq!(so.revision.host_payout, Currency::zero());
    assert_eq!(harness.store.references(&before[1]), 0);
}

#[tokio::test]
async fn test_partial_write() {
    let harness = Harness::new(1, RevisionConfig::for_testing());
    let old_root = harness.obligation().sector_roots[0];
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    renter
        .run_round(vec![Modification::Modify {
            index: 0,
            offset: 10,
            data: vec![1, 2, 3, 4],
        }])
        .await
        .unwrap();
    renter.stop().await.unwrap();
    handle.await.unwrap().unwrap();

    let mut expected = sector(1);
    expected[10..14].copy_from_slice(&[1, 2, 3, 4]);

    let so = harness.obligation();
    assert_eq!(so.sector_roots, vec![sector_root(&expected)]);
    assert_eq!(so.revision.file_size, TESTING_SECTOR_SIZE);
    assert_eq!(so.anticipated_revenue, Currency::zero());
    assert_eq!(
        so.confirmed_revenue,
        HostSettings::for_testing().upload_bandwidth_price * Currency::from(TESTING_SECTOR_SIZE)
    );

    use host_revision::SectorStore;
    assert_eq!(
        harness.store.read_sector(&so.sector_roots[0]).await.unwrap(),
        expected
    );
    assert!(harness.store.read_sector(&old_root).await.is_err());
}

#[tokio::test]
async fn test_unchanged_revision_number_aborts_session() {
    let harness = Harness::new(2, RevisionConfig::for_testing());
    let before = harness.obligation();
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    let result = renter
        .run_round_with(
            vec![Modification::Insert {
                index: 0,
                data: sector(9),
            }],
            |revision| revision.revision_number -= 1,
            |_| {},
        )
        .await;

    match result {
        Err(SessionError::PeerRejected(reason)) => assert!(reason.contains("Revision number")),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(matches!(
        handle.await.unwrap(),
        Err(SessionError::Revision(
            RevisionError::RevisionNumberNotIncreased { .. }
        ))
    ));
    assert_eq!(harness.obligation(), before);
    assert!(!harness.service.locker().is_locked(&CONTRACT_ID));
}

#[tokio::test]
async fn test_settings_update_keeps_existing_contracts_serviceable() {
    let harness = Harness::new(2, RevisionConfig::for_testing());
    harness.service.host_state().update_settings(HostSettings {
        sector_size: 2 * TESTING_SECTOR_SIZE,
        upload_bandwidth_price: Currency::from(3u64),
        ..HostSettings::for_testing()
    });
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    let settings = renter.read_settings().await.unwrap();
    assert_eq!(settings.sector_size, TESTING_SECTOR_SIZE);
    assert_eq!(settings.upload_bandwidth_price, Currency::from(3u64));
    renter.stop_after_settings().await.unwrap();

    assert_eq!(
        handle.await.unwrap().unwrap(),
        SessionOutcome::Stopped { rounds: 0 }
    );
}

#[tokio::test]
async fn test_round_after_settings_update() {
    let harness = Harness::new(2, RevisionConfig::for_testing());
    harness.service.host_state().update_settings(HostSettings {
        sector_size: 2 * TESTING_SECTOR_SIZE,
        ..HostSettings::for_testing()
    });
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    renter
        .run_round(vec![Modification::Insert {
            index: 2,
            data: sector(0x33),
        }])
        .await
        .unwrap();
    renter.stop().await.unwrap();

    handle.await.unwrap().unwrap();
    let so = harness.obligation();
    assert_eq!(so.sector_roots.len(), 3);
    assert_eq!(so.revision.file_size, 3 * TESTING_SECTOR_SIZE);
}

#[tokio::test]
async fn test_several_rounds_then_stop() {
    let harness = Harness::new(0, RevisionConfig::for_testing());
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    for i in 0..3u8 {
        renter
            .run_round(vec![Modification::Insert {
                index: i as u64,
                data: sector(i + 10),
            }])
            .await
            .unwrap();
    }
    renter
        .run_round(vec![
            Modification::Delete { index: 0 },
            Modification::Modify {
                index: 1,
                offset: 0,
                data: vec![0xFF; 64],
            },
        ])
        .await
        .unwrap();
    renter.stop().await.unwrap();

    assert_eq!(
        handle.await.unwrap().unwrap(),
        SessionOutcome::Stopped { rounds: 4 }
    );
    let so = harness.obligation();
    assert_eq!(so.revision.revision_number, 5);
    assert_eq!(so.sector_roots, renter.roots);
    assert!(so.is_consistent(TESTING_SECTOR_SIZE));
}

#[tokio::test]
async fn test_renter_signature_over_whole_transaction_rejected() {
    let harness = Harness::new(1, RevisionConfig::for_testing());
    let before = harness.obligation();
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    let result = renter
        .run_round_with(
            vec![Modification::Delete { index: 0 }],
            |_| {},
            |signature| {
                signature.covered_fields = CoveredFields {
                    whole_transaction: true,
                    ..Default::default()
                }
            },
        )
        .await;

    assert!(matches!(result, Err(SessionError::PeerRejected(_))));
    assert!(matches!(
        handle.await.unwrap(),
        Err(SessionError::Signing(SigningError::RenterOverreach))
    ));
    assert_eq!(harness.obligation(), before);
}

#[tokio::test]
async fn test_bad_index_rejected_before_revision() {
    let harness = Harness::new(1, RevisionConfig::for_testing());
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    renter.read_settings().await.unwrap();
    host_revision::application::write_accept(&mut renter.conn)
        .await
        .unwrap();
    let actions: Vec<host_revision::RevisionAction> = vec![Modification::Delete { index: 4 }.into()];
    write_object(&mut renter.conn, &actions).await.unwrap();

    let response = host_revision::application::read_response(&mut renter.conn, 1_000).await;
    assert!(matches!(response, Err(SessionError::PeerRejected(_))));
    assert!(matches!(
        handle.await.unwrap(),
        Err(SessionError::Modification(
            ModificationError::BadModificationIndex { index: 4, len: 1 }
        ))
    ));
}

#[tokio::test]
async fn test_renter_refuses_settings() {
    let harness = Harness::new(1, RevisionConfig::for_testing());
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    renter.refuse("too expensive").await.unwrap();

    match handle.await.unwrap() {
        Err(SessionError::PeerRejected(reason)) => assert_eq!(reason, "too expensive"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_oversized_batch_aborts_without_reply() {
    let settings = HostSettings {
        max_revise_batch_size: 1_000,
        ..HostSettings::for_testing()
    };
    let harness = Harness::with_settings(0, RevisionConfig::for_testing(), settings);
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    renter.read_settings().await.unwrap();
    host_revision::application::write_accept(&mut renter.conn)
        .await
        .unwrap();
    let actions: Vec<host_revision::RevisionAction> = vec![Modification::Insert {
        index: 0,
        data: sector(1),
    }
    .into()];
    write_object(&mut renter.conn, &actions).await.unwrap();

    assert!(matches!(
        handle.await.unwrap(),
        Err(SessionError::Conn(ConnError::ObjectTooLarge { .. }))
    ));
    // Host hung up without a rejection frame.
    assert!(matches!(
        renter.conn.read_frame(1_000).await,
        Err(ConnError::Closed)
    ));
}

#[tokio::test]
async fn test_unknown_contract_rejected() {
    let harness = Harness::new(1, RevisionConfig::for_testing());
    let (mut renter, handle) = harness.connect();

    write_object(&mut renter.conn, &[0x13u8; 32]).await.unwrap();
    assert!(matches!(
        renter.read_recent().await,
        Err(SessionError::PeerRejected(_))
    ));
    assert!(matches!(
        handle.await.unwrap(),
        Err(SessionError::ObligationNotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_silent_renter_hits_round_deadline() {
    let harness = Harness::new(1, RevisionConfig::for_testing());
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    let _settings: SignedSettings = read_object(&mut renter.conn, 16_000).await.unwrap();

    // Renter keeps the connection open but never answers.
    assert!(matches!(
        handle.await.unwrap(),
        Err(SessionError::Conn(ConnError::DeadlineExceeded))
    ));
    assert!(!harness.service.locker().is_locked(&CONTRACT_ID));
}

#[tokio::test(start_paused = true)]
async fn test_session_times_out_between_rounds() {
    let config = RevisionConfig {
        session_duration_secs: 10,
        round_deadline_secs: 60,
        ..RevisionConfig::for_testing()
    };
    let harness = Harness::new(1, config);
    let (mut renter, handle) = harness.connect();

    renter.open().await.unwrap();
    tokio::time::sleep(Duration::from_secs(15)).await;
    renter
        .run_round(vec![Modification::Delete { index: 0 }])
        .await
        .unwrap();

    assert_eq!(
        handle.await.unwrap().unwrap(),
        SessionOutcome::TimedOut { rounds: 1 }
    );
    assert_eq!(harness.obligation().revision.revision_number, 2);
}

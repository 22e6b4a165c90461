mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use common::{Direction, Point};
use protocol::packets::{PASSWORD_LONG_LEN, PASSWORD_SHORT_LEN};
use protocol::{ClientVersion, HeaderKind, Language};
use server::config::ServerConfig;
use server::dispatch::{ClientVersionObserver, DispatchOutcome, HandlerId, PacketDispatcher, VersionGate};
use server::game::GameAction;
use server::handlers::{SEASON_6_ENGLISH, SEASON_6_KOREAN, V097};
use support::{chat_packet, login_packet, select_packet, walk_packet, Recorder};

fn setup(version: ClientVersion) -> (Arc<VersionGate>, PacketDispatcher) {
    let config = ServerConfig {
        client_version: version,
        ..ServerConfig::default()
    };
    server::build_dispatcher(&config).expect("dispatcher")
}

#[tokio::test]
async fn test_walk_uses_dialect_of_configured_client() {
    let (_gate, dispatcher) = setup(SEASON_6_ENGLISH);
    let recorder = Recorder::default();
    let mut ctx = recorder.context(1);

    let outcome = dispatcher
        .dispatch(&mut ctx, &walk_packet(0xD4, 10, 10, &[0x53], 2))
        .await;
    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(
        dispatcher.registry().effective_id(0xD4),
        Some(HandlerId("walk-s6-english"))
    );

    let actions = recorder.actions();
    let [GameAction::Walk { target, steps, .. }] = actions.as_slice() else {
        panic!("expected one walk action");
    };
    assert_eq!(*target, Point::new(12, 11));
    let mut steps = steps.clone();
    assert_eq!(steps.pop().map(|step| step.direction), Some(Direction::SouthEast));
    assert_eq!(steps.pop().map(|step| step.direction), Some(Direction::East));

    // the pre-0.97 opcode is not served to Season 6 clients
    assert_eq!(
        dispatcher
            .dispatch(&mut ctx, &walk_packet(0x10, 10, 10, &[0x53], 2))
            .await,
        DispatchOutcome::UnknownOpcode(0x10)
    );
}

#[tokio::test]
async fn test_version_change_converges_registry() {
    let (gate, dispatcher) = setup(V097);
    let recorder = Recorder::default();
    let mut ctx = recorder.context(1);
    let old_walk = walk_packet(0x10, 10, 10, &[0x53], 2);

    assert_eq!(dispatcher.dispatch(&mut ctx, &old_walk).await, DispatchOutcome::Handled);
    assert_eq!(
        dispatcher.registry().effective_id(0xD4),
        Some(HandlerId("walk-097"))
    );

    gate.on_client_version_changed(SEASON_6_ENGLISH);
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &old_walk).await,
        DispatchOutcome::UnknownOpcode(0x10)
    );
    assert_eq!(
        dispatcher.registry().effective_id(0xD4),
        Some(HandlerId("walk-s6-english"))
    );
    assert_eq!(
        dispatcher.registry().effective_id(0xD7),
        Some(HandlerId("hit-s6-english"))
    );

    gate.on_client_version_changed(SEASON_6_KOREAN);
    assert_eq!(
        dispatcher.registry().effective_id(0xD4),
        Some(HandlerId("walk-097"))
    );
    assert_eq!(
        dispatcher.registry().effective_id(0xD3),
        Some(HandlerId("walk-s6-korean"))
    );
    assert_eq!(dispatcher.registry().effective_id(0xD7), None);
}

#[tokio::test]
async fn test_login_requires_encryption() {
    let (_gate, dispatcher) = setup(SEASON_6_ENGLISH);
    let recorder = Recorder::default();
    let mut ctx = recorder.context(1);

    let plaintext = login_packet(HeaderKind::C1, "admin", "pass", PASSWORD_LONG_LEN);
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &plaintext).await,
        DispatchOutcome::EncryptionMismatch(0xF1)
    );
    assert!(recorder.actions().is_empty());

    let encrypted = login_packet(HeaderKind::C3, "admin", "pass", PASSWORD_LONG_LEN);
    assert_eq!(dispatcher.dispatch(&mut ctx, &encrypted).await, DispatchOutcome::Handled);
    assert_eq!(
        recorder.actions(),
        vec![GameAction::Login {
            username: "admin".into(),
            password: "pass".into()
        }]
    );
}

#[tokio::test]
async fn test_login_dialect_follows_version() {
    let (gate, dispatcher) = setup(V097);
    let recorder = Recorder::default();

    let short = login_packet(HeaderKind::C3, "old", "secret", PASSWORD_SHORT_LEN);
    let mut ctx = recorder.context(1);
    assert_eq!(dispatcher.dispatch(&mut ctx, &short).await, DispatchOutcome::Handled);

    gate.on_client_version_changed(SEASON_6_ENGLISH);
    let mut ctx = recorder.context(2);
    // a short-password packet is too small for the Season 6 dialect
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &short).await,
        DispatchOutcome::Failed(0xF1)
    );
    let long = login_packet(HeaderKind::C3, "new", "longer-secret", PASSWORD_LONG_LEN);
    assert_eq!(dispatcher.dispatch(&mut ctx, &long).await, DispatchOutcome::Handled);
    assert_eq!(recorder.actions_of(2).len(), 1);

    assert_eq!(
        recorder.actions(),
        vec![
            GameAction::Login {
                username: "old".into(),
                password: "secret".into()
            },
            GameAction::Login {
                username: "new".into(),
                password: "longer-secret".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_groups_are_isolated() {
    let (_gate, dispatcher) = setup(SEASON_6_ENGLISH);
    let recorder = Recorder::default();
    let mut ctx = recorder.context(1);
    ctx.player.account = Some("admin".into());

    dispatcher.dispatch(&mut ctx, &select_packet("Hero")).await;
    dispatcher
        .dispatch(&mut ctx, &[0xC1, 6, 0xD0, 0x03, 1, 2])
        .await;

    assert_eq!(
        recorder.actions(),
        vec![
            GameAction::SelectCharacter {
                name: "Hero".into()
            },
            GameAction::EventRemainTime {
                event_type: 1,
                item_level: 2
            },
        ]
    );
}

#[tokio::test]
async fn test_unimplemented_sub_opcode_is_dropped() {
    let (_gate, dispatcher) = setup(SEASON_6_ENGLISH);
    let recorder = Recorder::default();
    let mut ctx = recorder.context(1);

    dispatcher.dispatch(&mut ctx, &[0xC1, 4, 0xF3, 0x7F]).await;
    assert!(recorder.actions().is_empty());

    // the connection keeps working
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &chat_packet("still here")).await,
        DispatchOutcome::Handled
    );
}

#[tokio::test]
async fn test_hot_toggle() {
    let (gate, dispatcher) = setup(SEASON_6_ENGLISH);
    let recorder = Recorder::default();
    let mut ctx = recorder.context(1);

    gate.set_enabled("chat", false).unwrap();
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &chat_packet("hello")).await,
        DispatchOutcome::UnknownOpcode(0x00)
    );

    gate.set_enabled("chat", true).unwrap();
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &chat_packet("hello")).await,
        DispatchOutcome::Handled
    );
}

#[test]
fn test_lookups_never_observe_torn_state() {
    let gate = Arc::new(VersionGate::new(server::handlers::catalog(), V097));
    gate.initialize();
    let registry = gate.registry();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let effective = registry.lookup(0xD4).map(|entry| entry.id());
                    assert!(matches!(
                        effective,
                        Some(HandlerId("walk-097")) | Some(HandlerId("walk-s6-english"))
                    ));
                }
            })
        })
        .collect();

    let eng = ClientVersion::new(1, 4, Language::English);
    for round in 0..200 {
        let version = if round % 2 == 0 { eng } else { V097 };
        gate.on_client_version_changed(version);
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
}

mod support;

use std::sync::Arc;
use std::time::Duration;

use protocol::packets::PASSWORD_LONG_LEN;
use protocol::HeaderKind;
use server::config::{GatewayConfig, ServerConfig};
use server::game::GameAction;
use server::handlers::SEASON_6_ENGLISH;
use server::session::start_gateway;
use support::{chat_packet, login_packet, walk_packet, Recorder};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

fn test_config() -> ServerConfig {
    ServerConfig {
        gateway: GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        client_version: SEASON_6_ENGLISH,
        ..ServerConfig::default()
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_gateway_dispatches_stream_in_order() {
    let config = test_config();
    let (_gate, dispatcher) = server::build_dispatcher(&config).unwrap();
    let recorder = Recorder::default();
    let gateway = start_gateway(&config, dispatcher, Arc::new(recorder.clone()))
        .await
        .unwrap();

    let mut stream = TcpStream::connect(gateway.local_addr()).await.unwrap();
    let mut bytes = login_packet(HeaderKind::C3, "admin", "pass", PASSWORD_LONG_LEN);
    bytes.extend(walk_packet(0xD4, 10, 10, &[0x53], 2));
    bytes.extend([0xC1, 3, 0x77]);
    bytes.extend(chat_packet("hi"));

    // split the batch inside the chat packet
    let (first, second) = bytes.split_at(70);
    stream.write_all(first).await.unwrap();
    sleep(Duration::from_millis(20)).await;
    stream.write_all(second).await.unwrap();

    wait_for(|| recorder.actions().len() == 3).await;
    let actions = recorder.actions();
    assert!(matches!(actions[0], GameAction::Login { .. }));
    assert!(matches!(actions[1], GameAction::Walk { .. }));
    assert_eq!(actions[2], GameAction::Chat { message: "hi".into() });

    wait_for(|| gateway.sessions().len() == 1).await;
    drop(stream);
    wait_for(|| gateway.sessions().is_empty()).await;

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_gateway_closes_connection_on_framing_error() {
    let config = test_config();
    let (_gate, dispatcher) = server::build_dispatcher(&config).unwrap();
    let recorder = Recorder::default();
    let gateway = start_gateway(&config, dispatcher, Arc::new(recorder.clone()))
        .await
        .unwrap();

    let mut stream = TcpStream::connect(gateway.local_addr()).await.unwrap();
    stream.write_all(&chat_packet("before")).await.unwrap();
    wait_for(|| recorder.actions().len() == 1).await;

    stream.write_all(&[0x42, 0x03, 0x00]).await.unwrap();
    wait_for(|| gateway.sessions().is_empty()).await;

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_connections_are_independent() {
    let config = test_config();
    let (_gate, dispatcher) = server::build_dispatcher(&config).unwrap();
    let recorder = Recorder::default();
    let gateway = start_gateway(&config, dispatcher, Arc::new(recorder.clone()))
        .await
        .unwrap();

    let mut first = TcpStream::connect(gateway.local_addr()).await.unwrap();
    let mut second = TcpStream::connect(gateway.local_addr()).await.unwrap();
    first.write_all(&chat_packet("one")).await.unwrap();
    second.write_all(&chat_packet("two")).await.unwrap();

    wait_for(|| recorder.actions().len() == 2).await;
    wait_for(|| gateway.sessions().len() == 2).await;

    gateway.shutdown().await;
}

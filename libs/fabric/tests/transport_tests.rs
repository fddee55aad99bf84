use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use txlink_fabric::{
    codec::{BincodeCodec, Codec},
    error::Error,
    transport::{TcpTransport, TcpTransportListener, Transport},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TestMessage {
    id: u32,
    data: String,
}

/// Helper to get a free port
async fn get_listener() -> (TcpTransportListener, std::net::SocketAddr) {
    let listener = TcpTransportListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

#[tokio::test]
async fn tcp_send_receive_single_message() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        let received = transport.receive().await.unwrap();
        transport.send(&received).await.unwrap(); // Echo back
    });

    let mut client = TcpTransport::connect(addr).await.unwrap();
    let msg = b"hello world";
    client.send(msg).await.unwrap();
    let response = client.receive().await.unwrap();

    assert_eq!(response, msg);
}

#[tokio::test]
async fn split_halves_preserve_boundaries() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        for _ in 0..3 {
            let msg = transport.receive().await.unwrap();
            transport.send(&msg).await.unwrap();
        }
    });

    let client = TcpTransport::connect(addr).await.unwrap();
    let (mut reader, mut writer) = client.into_split();
    let messages = vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()];

    for msg in &messages {
        writer.send(msg).await.unwrap();
    }
    for msg in &messages {
        let response = reader.receive().await.unwrap();
        assert_eq!(&response, msg);
    }
}

#[tokio::test]
async fn tcp_receive_timeout_fires() {
    let (listener, addr) = get_listener().await;

    // Server that never responds
    tokio::spawn(async move {
        let (_transport, _addr) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let mut client = TcpTransport::builder()
        .address(addr)
        .receive_timeout(Some(Duration::from_millis(100)))
        .connect()
        .await
        .unwrap();

    client.send(b"hello").await.unwrap();

    match client.receive().await {
        Err(Error::Timeout(what)) => assert_eq!(what, "Receive"),
        other => panic!("Expected timeout error, got {:?}", other),
    }
}

#[tokio::test]
async fn tcp_rejects_oversized_frame() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    // Server that sends a frame header claiming 200MB (over the 100MB limit)
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_u32(200 * 1024 * 1024).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let mut client = TcpTransport::connect(addr).await.unwrap();

    match client.receive().await {
        Err(Error::InvalidFrame(msg)) => assert!(msg.contains("too large")),
        other => panic!("Expected InvalidFrame error, got {:?}", other),
    }
}

#[tokio::test]
async fn codec_roundtrip_over_tcp() {
    let (listener, addr) = get_listener().await;

    let expected = TestMessage {
        id: 42,
        data: "test data".to_string(),
    };

    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        let bytes = transport.receive().await.unwrap();
        let msg: TestMessage = BincodeCodec.decode(&bytes).unwrap();
        transport
            .send(&BincodeCodec.encode(&msg).unwrap())
            .await
            .unwrap();
    });

    let mut client = TcpTransport::connect(addr).await.unwrap();
    client
        .send(&BincodeCodec.encode(&expected).unwrap())
        .await
        .unwrap();
    let response: TestMessage = BincodeCodec.decode(&client.receive().await.unwrap()).unwrap();

    assert_eq!(response, expected);
}

#[tokio::test]
async fn connect_timeout_without_address_is_rejected() {
    let result = TcpTransport::builder()
        .connect_timeout(Some(Duration::from_millis(50)))
        .connect()
        .await;
    assert!(matches!(result, Err(Error::NoAddress)));
}

#[tokio::test]
async fn connection_closed_error() {
    let (listener, addr) = get_listener().await;

    // Server that immediately closes
    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        transport.close().await.unwrap();
    });

    let mut client = TcpTransport::connect(addr).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    match client.receive().await {
        Err(Error::ConnectionClosed) => {}
        other => panic!("Expected ConnectionClosed, got {:?}", other),
    }
}

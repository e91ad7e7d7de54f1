#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Live-socket scenarios matching the deployed client probes: an
//! unsigned packet must look like a dead server, a signed one must get
//! exactly one `done` reply.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use keep_protocol::config::KeepConfig;
use keep_protocol::core::packet::{Packet, SIGNATURE_LEN};
use keep_protocol::protocol::dispatcher::Dispatcher;
use keep_protocol::protocol::signer::{generate_key, signed};
use keep_protocol::protocol::verifier::AllowAll;
use keep_protocol::service::server::{serve_with_shutdown, ServerState};

struct TestServer {
    addr: std::net::SocketAddr,
    shutdown: mpsc::Sender<()>,
    handle: tokio::task::JoinHandle<keep_protocol::error::Result<()>>,
}

async fn start_server() -> TestServer {
    let mut config = KeepConfig::default();
    config.limits.read_timeout = Duration::from_millis(800);
    config.limits.read_idle_grace = Duration::from_millis(80);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = ServerState::new(
        &config,
        Arc::new(Dispatcher::with_defaults()),
        Arc::new(AllowAll),
    );
    let (shutdown, shutdown_rx) = mpsc::channel(1);
    let handle = tokio::spawn(serve_with_shutdown(
        listener,
        state,
        shutdown_rx,
        Duration::from_secs(2),
    ));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

impl TestServer {
    /// Send raw bytes like the probes do (write side left open) and
    /// collect whatever comes back until the server closes.
    async fn exchange(&self, wire: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(wire).await.unwrap();

        let mut reply = Vec::new();
        tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut reply))
            .await
            .expect("server should close the connection")
            .unwrap();
        reply
    }

    async fn stop(self) {
        self.shutdown.send(()).await.unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_a_unsigned_packet_gets_no_bytes() {
    let server = start_server().await;

    let packet = Packet::ask("test-123", "human:tester", "server", "make tea please");
    let reply = server.exchange(&packet.to_bytes()).await;
    assert!(
        reply.is_empty(),
        "unsigned packet must be dropped silently, got {} bytes",
        reply.len()
    );

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_b_signed_packet_gets_done_reply() {
    let server = start_server().await;

    let key = generate_key();
    let packet = signed(
        Packet::ask("signed-001", "human:signer", "server", "signed tea please"),
        &key,
    );
    let reply_bytes = server.exchange(&packet.to_bytes()).await;
    assert!(!reply_bytes.is_empty(), "signed packet should get a reply");

    let reply = Packet::from_bytes(&reply_bytes).unwrap();
    assert_eq!(reply.body, "done");
    assert_eq!(reply.id, "signed-001");
    assert_eq!(reply.src, "server");
    assert_eq!(reply.dst, "human:signer");
    assert!(reply.sig.is_empty() && reply.pk.is_empty());

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_key_is_as_silent_as_everything_else() {
    let server = start_server().await;

    // Valid-length signature, 31-byte key: rejected before any
    // signature math, with the same wire silence as any other drop.
    let mut packet = Packet::ask("shaped-1", "human:crafter", "server", "tea");
    packet.sig = vec![0x42; SIGNATURE_LEN];
    packet.pk = vec![0x17; 31];

    let reply = server.exchange(&packet.to_bytes()).await;
    assert!(reply.is_empty());

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn garbage_bytes_do_not_disturb_the_listener() {
    let server = start_server().await;

    let reply = server.exchange(&[0xDE, 0xAD, 0xBE, 0xEF, 0xFF]).await;
    assert!(reply.is_empty());

    // The listener must still serve the next, valid client.
    let key = generate_key();
    let packet = signed(Packet::ask("after-1", "human:signer", "server", "tea"), &key);
    let reply = server.exchange(&packet.to_bytes()).await;
    assert_eq!(Packet::from_bytes(&reply).unwrap().body, "done");

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_client_is_disconnected_without_bytes() {
    let server = start_server().await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    // Send nothing; the read timeout should close the connection.
    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut reply))
        .await
        .expect("server should close the idle connection")
        .unwrap();
    assert!(reply.is_empty());

    server.stop().await;
}

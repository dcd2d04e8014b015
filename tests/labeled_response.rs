//! Integration tests for labeled-response batching.

mod common;

use common::{TestClient, TestServer};

async fn labeled_client(server: &TestServer, nick: &str) -> TestClient {
    let mut client = server.connect(nick).await.expect("connect");
    client.send_raw("CAP LS 302").await.expect("send");
    client.recv().await.expect("ls");
    client
        .send_raw("CAP REQ :labeled-response batch")
        .await
        .expect("send");
    let ack = client.recv().await.expect("ack");
    assert_eq!(ack.arg(1), Some("ACK"));
    client.send_raw(&format!("NICK {nick}")).await.expect("send");
    client
        .send_raw(&format!("USER {nick} 0 * :{nick}"))
        .await
        .expect("send");
    client.send_raw("CAP END").await.expect("send");
    client.recv_command("376").await.expect("burst");
    client
}

#[tokio::test]
async fn test_single_reply_carries_label() {
    let server = TestServer::spawn().await.expect("spawn");
    let mut alice = labeled_client(&server, "alice").await;

    alice.send_raw("@label=p1 PING :x").await.expect("send");
    let pong = alice.recv().await.expect("recv");
    assert_eq!(pong.command, "PONG");
    assert_eq!(pong.tag("label"), Some("p1"));
}

#[tokio::test]
async fn test_no_reply_is_acked() {
    let server = TestServer::spawn().await.expect("spawn");
    let mut alice = labeled_client(&server, "alice").await;

    alice.send_raw("@label=a1 PONG :x").await.expect("send");
    let ack = alice.recv().await.expect("recv");
    assert_eq!(ack.command, "ACK");
    assert_eq!(ack.tag("label"), Some("a1"));
}

#[tokio::test]
async fn test_multiple_replies_are_batched() {
    let server = TestServer::spawn().await.expect("spawn");
    let mut alice = labeled_client(&server, "alice").await;

    alice.send_raw("@label=j1 JOIN #batch").await.expect("send");
    let messages = alice.recv_until(|m| m.command == "BATCH" && m.arg(0).is_some_and(|r| r.starts_with('-'))).await.expect("batch");

    let start = &messages[0];
    assert_eq!(start.command, "BATCH");
    assert_eq!(start.tag("label"), Some("j1"));
    assert_eq!(start.arg(1), Some("labeled-response"));
    let reference = start.arg(0).and_then(|r| r.strip_prefix('+')).expect("ref").to_string();

    let inner: Vec<&str> = messages[1..messages.len() - 1]
        .iter()
        .inspect(|m| assert_eq!(m.tag("batch"), Some(reference.as_str())))
        .map(|m| m.command.as_str())
        .collect();
    assert_eq!(inner, vec!["JOIN", "353", "366"]);
    assert_eq!(messages.last().and_then(|m| m.arg(0)), Some(format!("-{reference}").as_str()));
}

#[tokio::test]
async fn test_label_ignored_without_caps() {
    let server = TestServer::spawn().await.expect("spawn");
    let mut bob = server.connect_registered("bob").await.expect("bob");

    bob.send_raw("@label=x PING :y").await.expect("send");
    let pong = bob.recv().await.expect("recv");
    assert_eq!(pong.command, "PONG");
    assert_eq!(pong.tag("label"), None);
}

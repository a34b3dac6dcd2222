use std::time::Duration;

use replikv::{
    input::{new_read_buffer, read_and_parse_resp, read_reply, CommandReadError},
    rdb::empty_rdb,
    resp::{encode_snapshot_payload, RespValue},
};
use tokio::{net::TcpListener, time::timeout};

use crate::test_utils::{TestClient, TestUtils};

const SNAPSHOT: &[u8] = b"REDIS0011\xFE\x00\xFB\x01\x00\x00\x05mango\x05apple\xFF";

fn bulk(value: &str) -> RespValue {
    RespValue::BulkString(value.to_string())
}

fn simple(value: &str) -> RespValue {
    RespValue::SimpleString(value.to_string())
}

/// Runs the replica side of the handshake on `client` and returns the
/// `FULLRESYNC` line and the snapshot it was sent.
async fn full_resync(client: &mut TestClient) -> (String, Vec<u8>) {
    assert_eq!(client.send(&["PING"]).await, simple("PONG"));
    assert_eq!(
        client.send(&["REPLCONF", "listening-port", "6380"]).await,
        simple("OK")
    );
    assert_eq!(
        client.send(&["REPLCONF", "capa", "psync2"]).await,
        simple("OK")
    );

    let RespValue::SimpleString(line) = client.send(&["PSYNC", "?", "-1"]).await else {
        panic!("expected a FULLRESYNC line");
    };
    let snapshot = client.read_snapshot_payload().await;

    (line, snapshot)
}

#[tokio::test]
async fn test_set_and_get_over_tcp() {
    let (port, _server) = TestUtils::spawn_server(&[]).await;
    let mut client = TestClient::connect(port).await;

    assert_eq!(client.send(&["PING"]).await, simple("PONG"));
    assert_eq!(client.send(&["ECHO", "hey"]).await, bulk("hey"));
    assert_eq!(client.send(&["SET", "fruit", "mango"]).await, simple("OK"));
    assert_eq!(client.send(&["GET", "fruit"]).await, bulk("mango"));
    assert_eq!(client.send(&["GET", "vegetable"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_pipelined_requests_are_answered_in_order() {
    let (port, _server) = TestUtils::spawn_server(&[]).await;
    let mut client = TestClient::connect(port).await;

    let mut pipeline = RespValue::command(&["SET", "fruit", "mango"]).encode();
    pipeline.push_str(&RespValue::command(&["GET", "fruit"]).encode());
    pipeline.push_str(&RespValue::command(&["PING"]).encode());
    client.write(pipeline.as_bytes()).await;

    assert_eq!(client.read_reply().await, simple("OK"));
    assert_eq!(client.read_reply().await, bulk("mango"));
    assert_eq!(client.read_reply().await, simple("PONG"));
}

#[tokio::test]
async fn test_key_expires_over_tcp() {
    let (port, _server) = TestUtils::spawn_server(&[]).await;
    let mut client = TestClient::connect(port).await;

    assert_eq!(
        client.send(&["SET", "fruit", "mango", "PX", "100"]).await,
        simple("OK")
    );
    assert_eq!(client.send(&["GET", "fruit"]).await, bulk("mango"));

    TestUtils::sleep_ms(200).await;

    assert_eq!(client.send(&["GET", "fruit"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_protocol_error_closes_only_that_connection() {
    let (port, _server) = TestUtils::spawn_server(&[]).await;
    let mut broken_client = TestClient::connect(port).await;
    let mut client = TestClient::connect(port).await;

    broken_client.write(b"hello\r\n").await;

    let reply = broken_client.read_reply().await;
    assert!(matches!(reply, RespValue::Error(_)), "{:?}", reply);

    let result = timeout(
        Duration::from_secs(2),
        read_reply(&mut broken_client.stream, &mut broken_client.buffer),
    )
    .await
    .unwrap();
    assert_eq!(result, Err(CommandReadError::ConnectionClosed));

    assert_eq!(client.send(&["PING"]).await, simple("PONG"));
}

#[tokio::test]
async fn test_oversized_frame_headers_close_only_that_connection() {
    let (port, _server) = TestUtils::spawn_server(&[]).await;
    let mut client = TestClient::connect(port).await;

    for header in [
        &b"*1000000000000\r\n"[..],
        &b"*1\r\n$18446744073709551615\r\nx\r\n"[..],
    ] {
        let mut broken_client = TestClient::connect(port).await;
        broken_client.write(header).await;

        let reply = broken_client.read_reply().await;
        assert!(matches!(reply, RespValue::Error(_)), "{:?}", reply);

        assert_eq!(client.send(&["PING"]).await, simple("PONG"));
    }
}

#[tokio::test]
async fn test_unrepresentable_expiration_is_acknowledged_and_dropped() {
    let (port, _server) = TestUtils::spawn_server(&[]).await;
    let mut client = TestClient::connect(port).await;

    assert_eq!(
        client
            .send(&["SET", "fruit", "mango", "EX", "18446744073709551615"])
            .await,
        simple("OK")
    );
    assert_eq!(client.send(&["GET", "fruit"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_snapshot_is_served_from_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fruits.rdb"), SNAPSHOT).unwrap();
    let dir_path = dir.path().to_string_lossy().to_string();

    let (port, _server) =
        TestUtils::spawn_server(&["--dir", &dir_path, "--dbfilename", "fruits.rdb"]).await;
    let mut client = TestClient::connect(port).await;

    assert_eq!(client.send(&["GET", "mango"]).await, bulk("apple"));
    assert_eq!(
        client.send(&["KEYS", "*"]).await,
        RespValue::Array(vec![bulk("mango")])
    );
    assert_eq!(
        client.send(&["CONFIG", "GET", "dir"]).await,
        RespValue::Array(vec![bulk("dir"), bulk(&dir_path)])
    );

    assert_eq!(client.send(&["SET", "mango", "kiwi"]).await, simple("OK"));
    assert_eq!(client.send(&["GET", "mango"]).await, bulk("kiwi"));
}

#[tokio::test]
async fn test_full_resync_sends_empty_snapshot_then_writes() {
    let (port, _server) = TestUtils::spawn_server(&[]).await;
    let mut replica = TestClient::connect(port).await;

    let (line, snapshot) = full_resync(&mut replica).await;

    let parts: Vec<&str> = line.split(' ').collect();
    assert_eq!(parts.len(), 3, "{}", line);
    assert_eq!(parts[0], "FULLRESYNC");
    assert_eq!(parts[1].len(), 40);
    assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(parts[2], "0");
    assert_eq!(snapshot, empty_rdb().unwrap());

    TestUtils::wait_for_replicas(port, 1).await;

    let mut client = TestClient::connect(port).await;
    assert_eq!(client.send(&["GET", "fruit"]).await, RespValue::Null);
    assert_eq!(client.send(&["SET", "fruit", "mango"]).await, simple("OK"));
    assert_eq!(
        client.send(&["SET", "fruit", "kiwi", "px", "100"]).await,
        simple("OK")
    );

    assert_eq!(
        replica.read_reply().await,
        RespValue::command(&["SET", "fruit", "mango"])
    );
    assert_eq!(
        replica.read_reply().await,
        RespValue::command(&["SET", "fruit", "kiwi", "px", "100"])
    );

    drop(replica);

    TestUtils::wait_for_replicas(port, 0).await;
}

#[tokio::test]
async fn test_full_resync_sends_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dump.rdb"), SNAPSHOT).unwrap();
    let dir_path = dir.path().to_string_lossy().to_string();

    let (port, _server) = TestUtils::spawn_server(&["--dir", &dir_path]).await;
    let mut replica = TestClient::connect(port).await;

    let (_, snapshot) = full_resync(&mut replica).await;

    assert_eq!(snapshot, SNAPSHOT);
}

#[tokio::test]
async fn test_writes_fan_out_to_replicas() {
    let (master_port, _master) = TestUtils::spawn_server(&[]).await;
    let replica_of = format!("127.0.0.1 {}", master_port);

    let (first_replica_port, _first_replica) =
        TestUtils::spawn_server(&["--replicaof", &replica_of]).await;
    let (second_replica_port, _second_replica) =
        TestUtils::spawn_server(&["--replicaof", &replica_of]).await;

    TestUtils::wait_for_replicas(master_port, 2).await;

    let mut client = TestClient::connect(master_port).await;
    assert_eq!(client.send(&["SET", "fruit", "mango"]).await, simple("OK"));
    assert_eq!(client.send(&["SET", "count", "1"]).await, simple("OK"));

    for port in [first_replica_port, second_replica_port] {
        TestUtils::wait_for_value(port, "fruit", bulk("mango")).await;
        TestUtils::wait_for_value(port, "count", bulk("1")).await;
    }

    let mut replica_client = TestClient::connect(first_replica_port).await;
    let RespValue::BulkString(info) = replica_client.send(&["INFO", "replication"]).await else {
        panic!("expected INFO to reply with a bulk string");
    };
    assert!(info.starts_with("role:slave\r\n"), "{}", info);
    assert!(info.contains(&format!("master_port:{}", master_port)), "{}", info);

    // Writes sent to a replica stay on that replica.
    assert_eq!(
        replica_client.send(&["SET", "local", "only"]).await,
        simple("OK")
    );
    assert_eq!(replica_client.send(&["GET", "local"]).await, bulk("only"));
    assert_eq!(client.send(&["GET", "local"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_replica_handshake_with_master() {
    let master = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let master_port = master.local_addr().unwrap().port();

    let (replica_port, _replica) =
        TestUtils::spawn_server(&["--replicaof", &format!("127.0.0.1 {}", master_port)]).await;

    let (mut stream, _) = timeout(Duration::from_secs(2), master.accept())
        .await
        .unwrap()
        .unwrap();
    let mut buffer = new_read_buffer();

    let replica_port = replica_port.to_string();
    let steps: Vec<(Vec<&str>, Vec<u8>)> = vec![
        (vec!["PING"], b"+PONG\r\n".to_vec()),
        (
            vec!["REPLCONF", "listening-port", replica_port.as_str()],
            b"+OK\r\n".to_vec(),
        ),
        (vec!["REPLCONF", "capa", "psync2"], b"+OK\r\n".to_vec()),
        (vec!["PSYNC", "?", "-1"], {
            let mut reply =
                b"+FULLRESYNC 8371b4fb1155b71f4a04d3e1bc3e18c4a990aeeb 0\r\n".to_vec();
            reply.extend(encode_snapshot_payload(&empty_rdb().unwrap()));
            reply.extend(RespValue::command(&["SET", "fruit", "mango"]).encode().into_bytes());
            reply.extend(RespValue::command(&["PING"]).encode().into_bytes());
            reply
        }),
    ];

    for (expected_request, reply) in steps {
        let requests = timeout(
            Duration::from_secs(2),
            read_and_parse_resp(&mut stream, &mut buffer),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(requests, vec![RespValue::command(&expected_request)]);

        tokio::io::AsyncWriteExt::write_all(&mut stream, &reply)
            .await
            .unwrap();
    }

    let replica_port: u16 = replica_port.parse().unwrap();
    TestUtils::wait_for_value(replica_port, "fruit", bulk("mango")).await;

    tokio::io::AsyncWriteExt::write_all(
        &mut stream,
        RespValue::command(&["SET", "fruit", "kiwi"]).encode().as_bytes(),
    )
    .await
    .unwrap();

    TestUtils::wait_for_value(replica_port, "fruit", bulk("kiwi")).await;
}

#[tokio::test]
async fn test_replica_fails_when_master_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let unused_port = listener.local_addr().unwrap().port();
    drop(listener);

    let (_, replica) =
        TestUtils::spawn_server(&["--replicaof", &format!("127.0.0.1 {}", unused_port)]).await;

    let result = timeout(Duration::from_secs(5), replica)
        .await
        .unwrap()
        .unwrap();

    assert!(result.is_err());
}

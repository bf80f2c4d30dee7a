//! End-to-end tests driving the full engine against a scripted server.

mod common;

use common::*;

use cassette_client::{
    ClientBuilder, ClientConfig, ClusterEvent, Consistency, CqlClient, CqlError, CqlValue,
    EventType, QueryResult, StaticCredentials,
};
use cassette_core::protocol::constants::{
    OPCODE_CREDENTIALS, OPCODE_EXECUTE, OPCODE_REGISTER, OPCODE_SUPPORTED,
};
use cassette_core::protocol::StatusChange;
use cassette_core::serialization::{CqlType, CqlWrite, FrameBuffer};
use cassette_derive::FromRow;

use std::sync::mpsc;

fn connect(script: Vec<u8>) -> CqlClient<ScriptedSocket> {
    let mut full = ready_frame();
    full.extend(script);
    let (socket, _) = ScriptedSocket::new(full);
    ClientBuilder::new(ClientConfig::default())
        .connect_with(socket)
        .unwrap()
}

#[test]
fn handshake_sends_canonical_startup_frame() {
    let (socket, written) = ScriptedSocket::new(ready_frame());
    let client = ClientBuilder::new(ClientConfig::default())
        .connect_with(socket)
        .unwrap();
    assert!(!client.is_closed());
    assert_eq!(
        *written.lock().unwrap(),
        vec![
            0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x16, 0x00, 0x01, 0x00, 0x0B, 0x43, 0x51,
            0x4C, 0x5F, 0x56, 0x45, 0x52, 0x53, 0x49, 0x4F, 0x4E, 0x00, 0x05, 0x33, 0x2E, 0x30,
            0x2E, 0x30,
        ]
    );
}

#[test]
fn handshake_authenticates_when_asked() {
    let mut script = authenticate_frame("org.apache.cassandra.auth.PasswordAuthenticator");
    script.extend(ready_frame());
    let (socket, written) = ScriptedSocket::new(script);

    let client = ClientBuilder::new(ClientConfig::default())
        .authenticator(StaticCredentials::new("cassandra", "cassandra"))
        .connect_with(socket)
        .unwrap();
    assert!(!client.is_closed());

    // The second request frame must be CREDENTIALS with a string map.
    let written = written.lock().unwrap();
    let startup_len = 8 + u32::from_be_bytes(written[4..8].try_into().unwrap()) as usize;
    let credentials = &written[startup_len..];
    assert_eq!(credentials[3], OPCODE_CREDENTIALS);
    let text = String::from_utf8_lossy(credentials);
    assert!(text.contains("username"));
    assert!(text.contains("cassandra"));
}

#[test]
fn handshake_without_authenticator_fails_cleanly() {
    let script = {
        let mut s = authenticate_frame("PasswordAuthenticator");
        s.extend(ready_frame());
        s
    };
    let (socket, _) = ScriptedSocket::new(script);
    let err = ClientBuilder::new(ClientConfig::default())
        .connect_with(socket)
        .unwrap_err();
    assert!(matches!(err, CqlError::BadCredentials(_)));
}

#[test]
fn use_keyspace_caches_and_skips_second_frame() {
    let mut client = connect(set_keyspace_frame("ks"));
    client.use_keyspace("ks").unwrap();
    assert_eq!(client.keyspace(), Some("ks"));
    // No more scripted frames: a second USE would hit the exhausted
    // socket, so succeeding here proves no frame was issued.
    client.use_keyspace("ks").unwrap();
    assert_eq!(client.unread_body(), 0);
}

#[test]
fn prepare_then_execute_writes_spec_body() {
    let id = [0x5A; 16];
    let mut script = prepared_frame(&id, &[("a", CqlType::Int), ("b", CqlType::Varchar)]);
    script.extend(void_result_frame());
    let mut full = ready_frame();
    full.extend(script);
    let (socket, written) = ScriptedSocket::new(full);
    let mut client = ClientBuilder::new(ClientConfig::default())
        .connect_with(socket)
        .unwrap();

    let stmt = client.prepare("INSERT INTO t(a,b) VALUES (?,?)").unwrap();
    assert_eq!(stmt.id(), &id[..]);
    assert_eq!(stmt.bind_count(), 2);

    let result = client
        .execute(&stmt, &[42i32.into(), "hi".into()], Some(Consistency::One))
        .unwrap();
    assert!(matches!(result, QueryResult::Void));

    // The execute frame is the last thing written.
    let mut expected = vec![0x01, 0x00, 0x00, OPCODE_EXECUTE, 0x00, 0x00, 0x00, 0x24];
    expected.extend_from_slice(&[0x00, 0x10]);
    expected.extend_from_slice(&id);
    expected.extend_from_slice(&[
        0x00, 0x02, // two values
        0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x2A, // [bytes] 42
        0x00, 0x00, 0x00, 0x02, 0x68, 0x69, // [bytes] "hi"
        0x00, 0x01, // consistency ONE
    ]);
    let written = written.lock().unwrap();
    assert!(written.ends_with(&expected));
}

#[test]
fn execute_rejects_wrong_arity() {
    let id = [0x01; 4];
    let script = prepared_frame(&id, &[("a", CqlType::Int)]);
    let mut client = connect(script);
    let stmt = client.prepare("INSERT INTO t(a) VALUES (?)").unwrap();
    let err = client.execute(&stmt, &[], None).unwrap_err();
    assert!(matches!(err, CqlError::Invalid(_)));
}

#[test]
fn unavailable_error_is_typed_and_connection_stays_ready() {
    let mut script = error_frame(|body| {
        body.write_int(0x1000).unwrap();
        body.write_string("Cannot achieve consistency").unwrap();
        body.write_consistency(Consistency::Quorum).unwrap();
        body.write_int(3).unwrap();
        body.write_int(1).unwrap();
    });
    script.extend(void_result_frame());
    let mut client = connect(script);

    let err = client
        .query("SELECT * FROM t", Consistency::Quorum)
        .unwrap_err();
    match err {
        CqlError::Unavailable {
            consistency,
            required,
            alive,
            ..
        } => {
            assert_eq!(consistency, Consistency::Quorum);
            assert_eq!(required, 3);
            assert_eq!(alive, 1);
        }
        other => panic!("unexpected error {:?}", other),
    }

    // The error body was drained; the connection accepts new requests.
    assert_eq!(client.unread_body(), 0);
    assert!(!client.is_closed());
    let result = client.query("SELECT 1", Consistency::One).unwrap();
    assert!(matches!(result, QueryResult::Void));
}

#[test]
fn unprepared_error_carries_statement_id() {
    let script = error_frame(|body| {
        body.write_int(0x2500).unwrap();
        body.write_string("statement evicted").unwrap();
        body.write_short_bytes(&[0xDE, 0xAD]).unwrap();
    });
    let mut client = connect(script);
    let err = client.query("SELECT 1", Consistency::One).unwrap_err();
    match err {
        CqlError::Unprepared { id } => assert_eq!(id, vec![0xDE, 0xAD]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[derive(Debug, Default, PartialEq, FromRow)]
struct User {
    user_name: String,
    birth_year: i64,
}

#[test]
fn rows_result_decodes_and_binds() {
    let script = rows_frame(
        &[("user_name", CqlType::Varchar), ("birth_year", CqlType::Bigint)],
        &[vec![
            Some(b"jsmith".to_vec()),
            Some(1378218642i64.to_be_bytes().to_vec()),
        ]],
    );
    let mut client = connect(script);

    match client
        .query("SELECT user_name, birth_year FROM users", Consistency::One)
        .unwrap()
    {
        QueryResult::Rows(mut rows) => {
            assert_eq!(rows.row_count(), 1);
            assert_eq!(rows.columns()[0].name, "user_name");
            assert_eq!(rows.columns()[0].ty, CqlType::Varchar);
            assert_eq!(rows.columns()[1].name, "birth_year");
            assert_eq!(rows.columns()[1].ty, CqlType::Bigint);

            let users: Vec<User> = rows.typed().unwrap();
            assert_eq!(
                users,
                vec![User {
                    user_name: "jsmith".to_string(),
                    birth_year: 1378218642,
                }]
            );
        }
        _ => panic!("expected rows"),
    }
    assert_eq!(client.unread_body(), 0);
}

#[test]
fn null_cells_bind_to_options() {
    #[derive(Debug, Default, FromRow)]
    struct Sparse {
        a: Option<i32>,
        b: Option<String>,
    }

    let script = rows_frame(
        &[("a", CqlType::Int), ("b", CqlType::Varchar)],
        &[vec![None, Some(b"x".to_vec())]],
    );
    let mut client = connect(script);
    match client.query("SELECT a, b FROM t", Consistency::One).unwrap() {
        QueryResult::Rows(mut rows) => {
            let sparse: Vec<Sparse> = rows.typed().unwrap();
            assert_eq!(sparse[0].a, None);
            assert_eq!(sparse[0].b.as_deref(), Some("x"));
        }
        _ => panic!("expected rows"),
    };
}

#[test]
fn partially_read_rows_drain_on_drop() {
    let cells = |v: &str| vec![Some(v.as_bytes().to_vec())];
    let mut script = rows_frame(
        &[("v", CqlType::Varchar)],
        &[cells("one"), cells("two"), cells("three")],
    );
    script.extend(void_result_frame());
    let mut client = connect(script);

    {
        let result = client.query("SELECT v FROM t", Consistency::One).unwrap();
        if let QueryResult::Rows(mut rows) = result {
            let first = rows.next_row().unwrap().unwrap();
            assert_eq!(first.get::<String>(0).unwrap(), "one");
            // Two rows left unread.
            drop(rows);
        } else {
            panic!("expected rows");
        }
    }

    assert_eq!(client.unread_body(), 0);
    let next = client.query("SELECT 1", Consistency::One).unwrap();
    assert!(matches!(next, QueryResult::Void));
}

#[test]
fn event_frames_never_satisfy_a_pending_request() {
    let mut event_body = FrameBuffer::new();
    event_body.write_string("STATUS_CHANGE").unwrap();
    event_body.write_string("UP").unwrap();
    event_body.write_inet(&"10.0.0.7:9042".parse().unwrap()).unwrap();

    // The event arrives between the request and its response.
    let mut script = event_frame(&event_body.into_bytes());
    script.extend(void_result_frame());

    let mut full = ready_frame();
    full.extend(script);
    let (socket, _) = ScriptedSocket::new(full);
    let (tx, rx) = mpsc::channel();
    let mut client = ClientBuilder::new(ClientConfig::default())
        .event_sink(tx)
        .connect_with(socket)
        .unwrap();

    let result = client.query("SELECT 1", Consistency::One).unwrap();
    assert!(matches!(result, QueryResult::Void));

    match rx.try_recv().unwrap() {
        ClusterEvent::Status { change, node } => {
            assert_eq!(change, StatusChange::Up);
            assert_eq!(node, "10.0.0.7:9042".parse().unwrap());
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn register_round_trip() {
    let mut script = ready_frame();
    script.extend(ready_frame()); // handshake READY + register READY
    let (socket, written) = ScriptedSocket::new(script);
    let mut client = ClientBuilder::new(ClientConfig::default())
        .connect_with(socket)
        .unwrap();

    client
        .register(&[EventType::TopologyChange, EventType::SchemaChange])
        .unwrap();

    let written = written.lock().unwrap();
    let startup_len = 8 + u32::from_be_bytes(written[4..8].try_into().unwrap()) as usize;
    let register = &written[startup_len..];
    assert_eq!(register[3], OPCODE_REGISTER);
    let text = String::from_utf8_lossy(register);
    assert!(text.contains("TOPOLOGY_CHANGE"));
    assert!(text.contains("SCHEMA_CHANGE"));
}

#[test]
fn options_returns_supported_multimap() {
    let mut body = FrameBuffer::new();
    body.write_string_multimap(&[
        (
            "CQL_VERSION".to_string(),
            vec!["3.0.0".to_string(), "3.0.5".to_string()],
        ),
        ("COMPRESSION".to_string(), vec!["snappy".to_string()]),
    ])
    .unwrap();
    let script = server_frame(OPCODE_SUPPORTED, &body.into_bytes());

    let mut client = connect(script);
    let supported = client.request_options().unwrap();
    assert_eq!(supported["CQL_VERSION"], vec!["3.0.0", "3.0.5"]);
    assert_eq!(supported["COMPRESSION"], vec!["snappy"]);
    assert_eq!(client.unread_body(), 0);
}

#[test]
fn compressed_frame_without_negotiation_is_protocol_error() {
    let script = compressed_frame(cassette_core::protocol::constants::OPCODE_RESULT, &[0, 0, 0, 1]);
    let mut client = connect(script);
    let err = client.query("SELECT 1", Consistency::One).unwrap_err();
    assert!(matches!(err, CqlError::Protocol(_)));
    // The raw body was discarded, keeping the accounting clean.
    assert_eq!(client.unread_body(), 0);
}

#[test]
fn io_failure_closes_the_connection() {
    // Script ends after the handshake: the next read hits EOF.
    let mut client = connect(Vec::new());
    let err = client.query("SELECT 1", Consistency::One).unwrap_err();
    assert!(matches!(err, CqlError::Io(_)));
    assert!(client.is_closed());
    assert!(matches!(
        client.query("SELECT 1", Consistency::One),
        Err(CqlError::Closed)
    ));
}

#[test]
fn bound_null_values_round_trip_to_wire() {
    let id = [0x77; 4];
    let mut script = prepared_frame(&id, &[("a", CqlType::Int)]);
    script.extend(void_result_frame());
    let mut full = ready_frame();
    full.extend(script);
    let (socket, written) = ScriptedSocket::new(full);
    let mut client = ClientBuilder::new(ClientConfig::default())
        .connect_with(socket)
        .unwrap();

    let stmt = client.prepare("INSERT INTO t(a) VALUES (?)").unwrap();
    client.execute(&stmt, &[CqlValue::Null], None).unwrap();

    let written = written.lock().unwrap();
    // [short bytes id][short 1][bytes -1][consistency]
    let tail = [
        0x00, 0x04, 0x77, 0x77, 0x77, 0x77, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x01,
    ];
    assert!(written.ends_with(&tail));
}

// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline runs against a real temp database and a transport
//! that replays canned response documents.

use posfetch_client::{ClientError, Transport};
use posfetch_ingest::{DestinationStore, Pipeline, PipelineError};
use posfetch_model::{Credentials, PipelineConfig, Posident};
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

struct FakeTransport {
    responses: RefCell<VecDeque<Result<String, ClientError>>>,
    requests: RefCell<Vec<String>>,
}

impl FakeTransport {
    fn new(responses: Vec<Result<String, ClientError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for FakeTransport {
    fn round_trip(&self, request: &str) -> Result<String, ClientError> {
        self.requests.borrow_mut().push(request.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no canned response left".into())))
    }
}

fn envelope(body: &str) -> String {
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <v2:CtiOsResponse xmlns:v2="http://katastr.cuzk.cz/ctios/types/v2.8">
{body}
    </v2:CtiOsResponse>
  </soapenv:Body>
</soapenv:Envelope>"#
    )
}

fn success_os(posident: &str, os_id: &str, detail: &[(&str, &str)]) -> String {
    let detail: String = detail
        .iter()
        .map(|(k, v)| format!("<v2:{k}>{v}</v2:{k}>"))
        .collect();
    format!(
        "<v2:os><v2:pOSIdent>{posident}</v2:pOSIdent><v2:osId>{os_id}</v2:osId>\
         <v2:osDetail>{detail}</v2:osDetail></v2:os>"
    )
}

fn error_os(posident: &str, code: &str) -> String {
    format!(
        "<v2:os><v2:pOSIdent>{posident}</v2:pOSIdent>\
         <v2:chybaPOSIdent>{code}</v2:chybaPOSIdent></v2:os>"
    )
}

fn seed_db(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("dest.db");
    let conn = Connection::open(&path).expect("open");
    conn.execute_batch(
        "CREATE TABLE OPSUB (id TEXT PRIMARY KEY, STAV_DAT TEXT, DATUM_VZNIKU TEXT)",
    )
    .expect("create");
    for id in rows {
        conn.execute("INSERT INTO OPSUB (id) VALUES (?1)", [id])
            .expect("insert");
    }
    path
}

fn ids(raw: &[&str]) -> Vec<Posident> {
    raw.iter().map(|s| Posident::parse(s).expect("id")).collect()
}

fn credentials() -> Credentials {
    Credentials {
        username: "user".to_string(),
        password: "secret".to_string(),
    }
}

#[test]
fn duplicates_are_removed_but_counted_as_submitted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seed_db(dir.path(), &["x", "y"]);
    let transport = FakeTransport::new(vec![Ok(envelope(&format!(
        "{}{}",
        success_os("x", "1", &[("stavDat", "0")]),
        success_os("y", "2", &[("stavDat", "0")])
    )))]);
    let credentials = credentials();
    let config = PipelineConfig::default();
    let mut store = DestinationStore::open(&db, &config.destination_table).expect("open");

    let report = Pipeline::new(&transport, &credentials, &config)
        .run(&ids(&["x", "x", "y"]), &mut store)
        .expect("run");

    assert_eq!(report.tally.total_submitted, 3);
    assert_eq!(report.tally.duplicates_removed, 1);
    assert_eq!(report.tally.batch_count, 1);
    assert_eq!(report.tally.success, 2);
    assert_eq!(transport.requests.borrow().len(), 1);
    // The one request names each unique identifier exactly once.
    let request = transport.requests.borrow()[0].clone();
    assert_eq!(request.matches("<v2:pOSIdent>").count(), 2);
}

#[test]
fn rejections_are_counted_and_do_not_block_successes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seed_db(dir.path(), &["a", "b", "c"]);
    let transport = FakeTransport::new(vec![Ok(envelope(&format!(
        "{}{}{}",
        error_os("a", "NEPLATNY_IDENTIFIKATOR"),
        error_os("b", "EXPIROVANY_IDENTIFIKATOR"),
        success_os("c", "7", &[("stavDat", "0"), ("datumVzniku", "2020-02-20")])
    )))]);
    let credentials = credentials();
    let config = PipelineConfig::default();
    let mut store = DestinationStore::open(&db, &config.destination_table).expect("open");

    let report = Pipeline::new(&transport, &credentials, &config)
        .run(&ids(&["a", "b", "c"]), &mut store)
        .expect("run");

    assert_eq!(report.tally.invalid_identifier, 1);
    assert_eq!(report.tally.expired_identifier, 1);
    assert_eq!(report.tally.success, 1);
    assert_eq!(report.committed.len(), 1);
    assert_eq!(report.rejected.len(), 2);

    let conn = Connection::open(&db).expect("open");
    let os_id: String = conn
        .query_row("SELECT OS_ID FROM OPSUB WHERE id = 'c'", [], |r| r.get(0))
        .expect("query");
    assert_eq!(os_id, "7");
    let stav: String = conn
        .query_row("SELECT STAV_DAT FROM OPSUB WHERE id = 'c'", [], |r| r.get(0))
        .expect("query");
    assert_eq!(stav, "0");
}

#[test]
fn unconvertible_record_is_skipped_and_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seed_db(dir.path(), &["a", "b"]);
    let transport = FakeTransport::new(vec![Ok(envelope(&format!(
        "{}{}",
        success_os("a", "1", &[("neznamyAtribut", "x")]),
        success_os("b", "2", &[("stavDat", "0")])
    )))]);
    let credentials = credentials();
    let config = PipelineConfig::default();
    let mut store = DestinationStore::open(&db, &config.destination_table).expect("open");

    let report = Pipeline::new(&transport, &credentials, &config)
        .run(&ids(&["a", "b"]), &mut store)
        .expect("run");

    assert_eq!(report.mapping_failures.len(), 1);
    assert_eq!(report.mapping_failures[0].0.as_str(), "a");
    assert_eq!(report.committed.len(), 1);
    assert_eq!(report.committed[0].posident.as_str(), "b");

    // The skipped record left no trace in the destination.
    let conn = Connection::open(&db).expect("open");
    let os_id: Option<String> = conn
        .query_row("SELECT OS_ID FROM OPSUB WHERE id = 'a'", [], |r| r.get(0))
        .expect("query");
    assert_eq!(os_id, None);
}

#[test]
fn transport_failure_halts_with_earlier_batches_intact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seed_db(dir.path(), &["a", "b", "c"]);
    let transport = FakeTransport::new(vec![
        Ok(envelope(&format!(
            "{}{}",
            success_os("a", "1", &[("stavDat", "0")]),
            success_os("b", "2", &[("stavDat", "0")])
        ))),
        Err(ClientError::Transport("connection reset".into())),
    ]);
    let credentials = credentials();
    let config = PipelineConfig {
        batch_size: 2,
        ..PipelineConfig::default()
    };
    let mut store = DestinationStore::open(&db, &config.destination_table).expect("open");

    let err = Pipeline::new(&transport, &credentials, &config)
        .run(&ids(&["a", "b", "c"]), &mut store)
        .expect_err("must halt");
    assert!(matches!(err, PipelineError::Client { batch: 2, .. }));

    // Batch one is committed; the halt does not unwind it.
    let conn = Connection::open(&db).expect("open");
    let os_id: String = conn
        .query_row("SELECT OS_ID FROM OPSUB WHERE id = 'a'", [], |r| r.get(0))
        .expect("query");
    assert_eq!(os_id, "1");
}

#[test]
fn count_mismatch_is_a_protocol_error_that_halts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seed_db(dir.path(), &["a", "b"]);
    let transport = FakeTransport::new(vec![Ok(envelope(&success_os(
        "a",
        "1",
        &[("stavDat", "0")],
    )))]);
    let credentials = credentials();
    let config = PipelineConfig::default();
    let mut store = DestinationStore::open(&db, &config.destination_table).expect("open");

    let err = Pipeline::new(&transport, &credentials, &config)
        .run(&ids(&["a", "b"]), &mut store)
        .expect_err("must halt");
    match err {
        PipelineError::Client {
            batch: 1,
            source: ClientError::Protocol(_),
        } => {}
        other => panic!("expected protocol halt, got {other:?}"),
    }
}

#[test]
fn unrecognized_marker_is_reported_and_run_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seed_db(dir.path(), &["a", "b"]);
    let transport = FakeTransport::new(vec![Ok(envelope(&format!(
        "{}{}",
        error_os("a", "ZCELA_NOVA_CHYBA"),
        success_os("b", "2", &[("stavDat", "0")])
    )))]);
    let credentials = credentials();
    let config = PipelineConfig::default();
    let mut store = DestinationStore::open(&db, &config.destination_table).expect("open");

    let report = Pipeline::new(&transport, &credentials, &config)
        .run(&ids(&["a", "b"]), &mut store)
        .expect("run");

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].raw_code, "ZCELA_NOVA_CHYBA");
    assert_eq!(report.tally.classified(), 1);
    assert_eq!(report.committed.len(), 1);

    let rejects = report.rejects();
    assert_eq!(rejects.len(), 1);
    assert_eq!(rejects[0].1, "ZCELA_NOVA_CHYBA");
}

#[test]
fn empty_input_produces_an_empty_report_without_touching_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seed_db(dir.path(), &["a"]);
    let transport = FakeTransport::new(vec![]);
    let credentials = credentials();
    let config = PipelineConfig::default();
    let mut store = DestinationStore::open(&db, &config.destination_table).expect("open");

    let report = Pipeline::new(&transport, &credentials, &config)
        .run(&[], &mut store)
        .expect("run");
    assert_eq!(report.tally.total_submitted, 0);
    assert!(report.committed.is_empty());
    assert!(transport.requests.borrow().is_empty());

    // OS_ID is only added once there is work to do.
    let conn = Connection::open(&db).expect("open");
    let mut stmt = conn.prepare("PRAGMA table_info(OPSUB)").expect("pragma");
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(1))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows");
    assert!(!columns.contains(&"OS_ID".to_string()));
}

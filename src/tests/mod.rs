use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use serde_json::{json, Value};

use crate::auth::{AuthGuard, FileSession, MemorySession, SessionStore};
use crate::console::{Command, Console, Outcome};
use crate::endpoints::Endpoints;
use crate::error::ClientError;
use crate::paginator::{window_of, PageSize, PAGE_SIZES};
use crate::query::{derive, Filters, SortDirection, SortField, SortState, StatusFilter};
use crate::record::{Record, RecordForm};
use crate::transport::scripted::ScriptedTransport;

const BASE: &str = "https://api.test";

fn record(url: &str, name: &str, rut: &str, reason: &str, entry: Option<&str>, done: bool) -> Record {
    Record {
        id_or_url: url.to_string(),
        name: name.to_string(),
        identity_code: rut.to_string(),
        reason: reason.to_string(),
        entry_time: entry.map(str::to_string),
        exit_time: None,
        completed: done,
    }
}

fn sample() -> Vec<Record> {
    vec![
        record("u1", "Ana", "12345678-5", "Reunión", Some("2024-05-01T10:00:00Z"), true),
        record("u2", "Álvaro", "7654321-K", "Entrega", Some("2024-05-02T09:00:00Z"), false),
        record("u3", "bruno", "11111111-1", "reunion", None, false),
        record("u4", "Ana", "22222222-2", "Visita", Some("2024-05-01T10:00:00Z"), false),
        record("u5", "Carla", "33333333-3", "Entrega", Some("garbage"), true),
        record("u6", "ana maría", "44444444-4", "Reunión", Some("2024-04-30T18:30:00Z"), false),
    ]
}

fn ids(records: &[&Record]) -> Vec<String> {
    records.iter().map(|r| r.id_or_url.clone()).collect()
}

fn wire(r: &Record) -> Value {
    serde_json::to_value(r).unwrap()
}

fn console_on(transport: Arc<ScriptedTransport>, session: Box<dyn SessionStore>) -> (Console, Arc<AuthGuard>) {
    let guard = Arc::new(AuthGuard::new(session));
    let endpoints = Endpoints::new(BASE).unwrap();
    (Console::connect(transport, guard.clone(), &endpoints), guard)
}

#[test]
fn derived_view_is_a_subset_that_matches_every_filter() {
    let records = sample();
    let filters = Filters {
        search: "reun".to_string(),
        status: StatusFilter::Incomplete,
        ..Filters::default()
    };
    for field in SortField::ALL {
        let out = derive(&records, &filters, SortState::new(field, SortDirection::Ascending));
        assert_eq!(ids(&out).len(), 2, "{field:?}");
        for r in out {
            assert!(records.iter().any(|x| x == r));
            assert!(!r.completed);
            assert!(r.reason.to_lowercase().contains("reun"));
        }
    }
}

#[test]
fn clearing_filters_returns_every_record() {
    let records = sample();
    let narrowed = derive(
        &records,
        &Filters {
            name: "ana".to_string(),
            ..Filters::default()
        },
        SortState::default(),
    );
    assert_eq!(narrowed.len(), 3);
    let all = derive(&records, &Filters::default(), SortState::default());
    assert_eq!(all.len(), records.len());
}

#[test]
fn equal_keys_keep_input_order() {
    let records = sample();
    let out = derive(
        &records,
        &Filters::default(),
        SortState::new(SortField::EntryTime, SortDirection::Ascending),
    );
    let pos = |id: &str| ids(&out).iter().position(|x| x == id).unwrap();
    assert!(pos("u1") < pos("u4"));
    // missing and unparsable timestamps both sort as the epoch
    assert!(pos("u3") < pos("u5"));
    assert_eq!(&ids(&out)[..2], &["u3".to_string(), "u5".to_string()]);
}

#[test]
fn clicking_the_same_header_twice_reverses_distinct_keys() {
    let records = sample();
    let filters = Filters::default();
    let once = SortState::default().toggled(SortField::IdentityCode);
    let twice = once.toggled(SortField::IdentityCode);
    assert_eq!(once.direction, SortDirection::Ascending);
    let mut up = ids(&derive(&records, &filters, once));
    let down = ids(&derive(&records, &filters, twice));
    up.reverse();
    assert_eq!(up, down);
}

#[test]
fn windows_cover_the_list_exactly_once() {
    let records = sample();
    let refs = derive(&records, &Filters::default(), SortState::default());
    for size in PAGE_SIZES {
        let size = PageSize::new(size).unwrap();
        let first = window_of(&refs, size, 1);
        let mut seen = Vec::new();
        for page in 1..=first.max_page {
            seen.extend(ids(&window_of(&refs, size, page).items));
        }
        assert_eq!(seen, ids(&refs));
    }
}

#[test]
fn edit_form_round_trips_through_the_picker() {
    let tz = FixedOffset::west_opt(4 * 3600).unwrap();
    let original = record("u1", "Ana", "12345678-5", "Reunión", Some("2024-05-01T13:05:00Z"), false);
    let form = RecordForm::from_record(&original, &tz);
    assert_eq!(form.entry_time, "2024-05-01T09:05");
    let payload = form.to_payload(&tz).unwrap();
    assert_eq!(payload.entry_time.as_deref(), Some("2024-05-01T13:05:00.000Z"));
    assert_eq!(payload.exit_time, None);
}

#[tokio::test]
async fn rejected_token_logs_out_and_keeps_partial_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session");
    let session = FileSession::new(&path);
    session.save("stale").unwrap();

    let transport = Arc::new(
        ScriptedTransport::new()
            .reply(
                200,
                json!({"results": [wire(&sample()[0])], "next": format!("{BASE}/api/registros/?page=2")}),
            )
            .reply(401, json!({"code": "token_not_valid", "detail": "Given token not valid"})),
    );
    let (mut console, guard) = console_on(transport.clone(), Box::new(FileSession::new(&path)));

    let err = console.dispatch(Command::Refresh).await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert!(err.is_auth());
    assert_eq!(guard.current_token(), None);
    assert!(!path.exists());
    assert_eq!(console.store().len(), 1);

    let err = console.dispatch(Command::Refresh).await.unwrap_err();
    assert!(matches!(err, ClientError::NotLoggedIn));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn missing_entry_time_stays_null_through_an_edit() {
    let url = format!("{BASE}/api/registros/9/");
    let stored = record(&url, "Bruno", "11111111-1", "Entrega", None, false);
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply(200, json!([wire(&stored)]))
            .reply(200, json!({}))
            .reply(200, json!([wire(&stored)])),
    );
    let (mut console, _) = console_on(transport.clone(), Box::new(MemorySession::with_token("tok")));

    console.dispatch(Command::Refresh).await.unwrap();
    console.open_edit(&url, &Utc).unwrap();
    let form = console.panel_mut().form_mut().unwrap();
    assert_eq!(form.entry_time, "");
    form.completed = true;

    let outcome = console.submit_panel(&Utc).await.unwrap();
    assert!(matches!(outcome, Outcome::Updated(_)));
    assert!(!console.panel().is_open());

    let requests = transport.requests();
    assert_eq!(requests[1].method, reqwest::Method::PUT);
    assert_eq!(requests[1].url, url);
    let body = requests[1].body.clone().unwrap();
    assert_eq!(body["horaentrada"], Value::Null);
    assert_eq!(body["horasalida"], Value::Null);
    assert_eq!(body["estado_finalizado"], json!(true));
    assert_eq!(transport.remaining(), 0);
}

#[tokio::test]
async fn rejected_write_leaves_the_view_untouched() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply(200, json!(sample().iter().map(wire).collect::<Vec<_>>()))
            .reply(400, json!({"rut": ["Este campo es requerido."]})),
    );
    let (mut console, guard) = console_on(transport.clone(), Box::new(MemorySession::with_token("tok")));
    console.dispatch(Command::Refresh).await.unwrap();
    let revision = console.revision();

    console.open_create();
    let form = console.panel_mut().form_mut().unwrap();
    form.name = "Dana".to_string();
    form.identity_code = "9876543-2".to_string();
    form.reason = "Visita".to_string();

    let err = console.submit_panel(&Utc).await.unwrap_err();
    assert!(matches!(err, ClientError::Remote { status: 400, .. }));
    assert!(console.panel().is_open());
    assert_eq!(console.revision(), revision);
    assert_eq!(console.store().len(), sample().len());
    assert_eq!(guard.current_token().as_deref(), Some("tok"));
}

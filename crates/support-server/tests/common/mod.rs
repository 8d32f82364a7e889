#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use support_db::{ConnectionProvider, SqliteProvider, StoreSettings};
use support_server::AppState;
use tempfile::TempDir;

/// Wraps a provider and counts connection attempts and absences.
pub struct Counting<P> {
    inner: P,
    calls: AtomicUsize,
    misses: AtomicUsize,
}

impl<P> Counting<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Connection attempts that came back without a connection.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::SeqCst)
    }
}

impl<P: ConnectionProvider> ConnectionProvider for Counting<P> {
    fn connect(&self) -> Option<Connection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let conn = self.inner.connect();
        if conn.is_none() {
            self.misses.fetch_add(1, Ordering::SeqCst);
        }
        conn
    }
}

/// A provider that never has a connection.
pub struct Unavailable;

impl ConnectionProvider for Unavailable {
    fn connect(&self) -> Option<Connection> {
        None
    }
}

/// A SQLite provider over a file in a fresh temporary directory.
pub fn temp_provider() -> (TempDir, SqliteProvider) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let settings = StoreSettings {
        name: dir.path().join("support.db").to_string_lossy().into_owned(),
        ..StoreSettings::default()
    };
    (dir, SqliteProvider::new(settings))
}

/// State over a counted temp database.
pub fn counted_state(skip: bool) -> (TempDir, Arc<Counting<SqliteProvider>>, AppState) {
    let (dir, provider) = temp_provider();
    let counted = Arc::new(Counting::new(provider));
    let state = AppState::new(counted.clone(), skip);
    (dir, counted, state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn signup(username: &str, password: &str, name: &str) -> Request<Body> {
    let body = format!(
        "username={}&password={}&name={}",
        encode(username),
        encode(password),
        encode(name)
    );
    Request::builder()
        .uri("/signup")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn count_users(provider: &impl ConnectionProvider, username: &str) -> i64 {
    let conn = provider.connect().expect("failed to connect");
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        [username],
        |row| row.get(0),
    )
    .expect("failed to count users")
}

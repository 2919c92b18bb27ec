// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across an .await point.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Note, NoteContext, Person};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// A fresh in-memory database with all tables created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_note(&self, note: &Note) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::insert_note(&conn, note)
    }

    async fn find_notes(&self) -> Result<Vec<Note>> {
        let conn = self.conn.lock().await;
        super::queries::find_notes(&conn)
    }

    async fn find_note_by_slug(&self, slug: &str) -> Result<Option<Note>> {
        let conn = self.conn.lock().await;
        super::queries::find_note_by_slug(&conn, slug)
    }

    async fn find_note_by_url(&self, url: &str) -> Result<Option<Note>> {
        let conn = self.conn.lock().await;
        super::queries::find_note_by_url(&conn, url)
    }

    async fn insert_context(&self, context: &NoteContext) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_context(&conn, context)
    }

    async fn find_contexts_by_url(&self, url: &str) -> Result<Vec<NoteContext>> {
        let conn = self.conn.lock().await;
        super::queries::find_contexts_by_url(&conn, url)
    }

    async fn insert_person(&self, person: &Person) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::insert_person(&conn, person)
    }

    async fn find_person(&self, uid: &str) -> Result<Option<Person>> {
        let conn = self.conn.lock().await;
        super::queries::find_person(&conn, uid)
    }
}

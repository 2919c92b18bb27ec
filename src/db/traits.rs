// Database trait: backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite). Handlers hold an
// `Arc<dyn Database>`, so tests can swap in an in-memory database or a
// deliberately failing one.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Note, NoteContext, Person};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Notes ---

    /// Insert a new note. Fails if its slug or URL is already taken.
    async fn insert_note(&self, note: &Note) -> Result<()>;

    /// All notes, newest first. Unfiltered and unpaginated.
    async fn find_notes(&self) -> Result<Vec<Note>>;

    /// Look up a note by slug.
    async fn find_note_by_slug(&self, slug: &str) -> Result<Option<Note>>;

    /// Look up a note by canonical URL.
    async fn find_note_by_url(&self, url: &str) -> Result<Option<Note>>;

    // --- References ---

    /// Insert a cited post and return its row ID.
    async fn insert_context(&self, context: &NoteContext) -> Result<i64>;

    /// Stored contexts for a URL, most recent first.
    async fn find_contexts_by_url(&self, url: &str) -> Result<Vec<NoteContext>>;

    /// Insert a person. Fails if the uid is already known.
    async fn insert_person(&self, person: &Person) -> Result<()>;

    async fn find_person(&self, uid: &str) -> Result<Option<Person>>;
}

// Database queries: CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Note, NoteContext, Person};

const NOTE_COLUMNS: &str = "slug, url, name, content, summary, published, category, in_reply_to,
    like_of, repost_of, bookmark_of, photo, video, syndication, rsvp, post_types, mention_targets";

// --- Notes ---

/// Insert a new note. Fails if the slug or URL is already taken.
pub fn insert_note(conn: &Connection, note: &Note) -> Result<()> {
    conn.execute(
        "INSERT INTO notes (slug, url, name, content, summary, published, category, in_reply_to,
            like_of, repost_of, bookmark_of, photo, video, syndication, rsvp, post_types, mention_targets)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            note.slug,
            note.url,
            note.name,
            note.content,
            note.summary,
            format_timestamp(&note.published),
            serde_json::to_string(&note.category)?,
            serde_json::to_string(&note.in_reply_to)?,
            serde_json::to_string(&note.like_of)?,
            serde_json::to_string(&note.repost_of)?,
            serde_json::to_string(&note.bookmark_of)?,
            serde_json::to_string(&note.photo)?,
            serde_json::to_string(&note.video)?,
            serde_json::to_string(&note.syndication)?,
            note.rsvp,
            serde_json::to_string(&note.post_types)?,
            serde_json::to_string(&note.mention_targets)?,
        ],
    )
    .with_context(|| format!("Failed to insert note {}", note.slug))?;
    Ok(())
}

/// All notes, newest first.
pub fn find_notes(conn: &Connection) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes ORDER BY published DESC"
    ))?;
    let rows = stmt.query_map([], note_from_row)?;

    let mut notes = Vec::new();
    for row in rows {
        notes.push(row?);
    }
    Ok(notes)
}

/// Look up a note by slug.
pub fn find_note_by_slug(conn: &Connection, slug: &str) -> Result<Option<Note>> {
    let mut stmt = conn.prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE slug = ?1"))?;
    let note = stmt.query_row(params![slug], note_from_row).optional()?;
    Ok(note)
}

/// Look up a note by its canonical URL.
pub fn find_note_by_url(conn: &Connection, url: &str) -> Result<Option<Note>> {
    let mut stmt = conn.prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE url = ?1"))?;
    let note = stmt.query_row(params![url], note_from_row).optional()?;
    Ok(note)
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let published: String = row.get(5)?;
    Ok(Note {
        slug: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        content: row.get(3)?,
        summary: row.get(4)?,
        published: parse_timestamp(5, &published)?,
        category: json_list(row, 6)?,
        in_reply_to: json_list(row, 7)?,
        like_of: json_list(row, 8)?,
        repost_of: json_list(row, 9)?,
        bookmark_of: json_list(row, 10)?,
        photo: json_list(row, 11)?,
        video: json_list(row, 12)?,
        syndication: json_list(row, 13)?,
        rsvp: row.get(14)?,
        post_types: json_list(row, 15)?,
        mention_targets: json_list(row, 16)?,
    })
}

// --- Contexts ---

/// Insert a cited post and return its row ID.
pub fn insert_context(conn: &Connection, context: &NoteContext) -> Result<i64> {
    conn.execute(
        "INSERT INTO contexts (url, name, content, author_name, author_url, published, post_types)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            context.url,
            context.name,
            context.content,
            context.author_name,
            context.author_url,
            context.published,
            serde_json::to_string(&context.post_types)?,
        ],
    )
    .with_context(|| format!("Failed to insert context {}", context.url))?;
    Ok(conn.last_insert_rowid())
}

/// All stored contexts for a URL, most recent first.
pub fn find_contexts_by_url(conn: &Connection, url: &str) -> Result<Vec<NoteContext>> {
    let mut stmt = conn.prepare(
        "SELECT id, url, name, content, author_name, author_url, published, post_types
         FROM contexts WHERE url = ?1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![url], |row| {
        Ok(NoteContext {
            id: row.get(0)?,
            url: row.get(1)?,
            name: row.get(2)?,
            content: row.get(3)?,
            author_name: row.get(4)?,
            author_url: row.get(5)?,
            published: row.get(6)?,
            post_types: json_list(row, 7)?,
        })
    })?;

    let mut contexts = Vec::new();
    for row in rows {
        contexts.push(row?);
    }
    Ok(contexts)
}

// --- People ---

/// Insert a person. Fails if a person with the same uid already exists.
pub fn insert_person(conn: &Connection, person: &Person) -> Result<()> {
    conn.execute(
        "INSERT INTO people (uid, name, url, photo, post_types) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            person.uid,
            person.name,
            serde_json::to_string(&person.url)?,
            person.photo,
            serde_json::to_string(&person.post_types)?,
        ],
    )
    .with_context(|| format!("Failed to insert person {}", person.uid))?;
    Ok(())
}

pub fn find_person(conn: &Connection, uid: &str) -> Result<Option<Person>> {
    let mut stmt =
        conn.prepare("SELECT uid, name, url, photo, post_types FROM people WHERE uid = ?1")?;
    let person = stmt
        .query_row(params![uid], |row| {
            Ok(Person {
                uid: row.get(0)?,
                name: row.get(1)?,
                url: json_list(row, 2)?,
                photo: row.get(3)?,
                post_types: json_list(row, 4)?,
            })
        })
        .optional()?;
    Ok(person)
}

// --- Helpers ---

/// Timestamps are stored as RFC 3339 UTC with millisecond precision so that
/// lexical order matches chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a JSON-array column.
fn json_list<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<T>> {
    let json: String = row.get(idx)?;
    serde_json::from_str(&json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use crate::micropub::PostType;
    use chrono::TimeZone;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn note(slug: &str, published: DateTime<Utc>) -> Note {
        Note {
            slug: slug.to_string(),
            url: format!("https://example.com/notes/{slug}"),
            name: None,
            content: Some(format!("note {slug}")),
            summary: None,
            published,
            category: vec!["rust".to_string()],
            in_reply_to: Vec::new(),
            like_of: Vec::new(),
            repost_of: Vec::new(),
            bookmark_of: Vec::new(),
            photo: Vec::new(),
            video: Vec::new(),
            syndication: Vec::new(),
            rsvp: None,
            post_types: vec![PostType::Note],
            mention_targets: vec!["https://other.example/".to_string()],
        }
    }

    #[test]
    fn test_note_roundtrip() {
        let conn = test_db();
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let original = note("a", published);
        insert_note(&conn, &original).unwrap();

        let found = find_note_by_slug(&conn, "a").unwrap().unwrap();
        assert_eq!(found, original);
        assert_eq!(
            find_note_by_url(&conn, "https://example.com/notes/a").unwrap(),
            Some(original)
        );
        assert!(find_note_by_slug(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_list_column_is_an_error() {
        let conn = test_db();
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        insert_note(&conn, &note("a", published)).unwrap();
        conn.execute("UPDATE notes SET category = 'not json' WHERE slug = 'a'", [])
            .unwrap();

        assert!(find_note_by_slug(&conn, "a").is_err());
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let conn = test_db();
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        insert_note(&conn, &note("a", published)).unwrap();
        assert!(insert_note(&conn, &note("a", published)).is_err());
    }

    #[test]
    fn test_find_notes_newest_first() {
        let conn = test_db();
        let older = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        insert_note(&conn, &note("old", older)).unwrap();
        insert_note(&conn, &note("new", newer)).unwrap();

        let slugs: Vec<String> = find_notes(&conn)
            .unwrap()
            .into_iter()
            .map(|n| n.slug)
            .collect();
        assert_eq!(slugs, vec!["new", "old"]);
    }

    #[test]
    fn test_contexts_by_url() {
        let conn = test_db();
        let ctx = NoteContext {
            id: 0,
            url: "https://other.example/post".to_string(),
            name: Some("Their post".to_string()),
            content: None,
            author_name: None,
            author_url: None,
            published: None,
            post_types: vec![PostType::Article],
        };
        let id = insert_context(&conn, &ctx).unwrap();
        assert!(id > 0);

        let found = find_contexts_by_url(&conn, "https://other.example/post").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(found[0].post_types, vec![PostType::Article]);
    }

    #[test]
    fn test_person_unique_uid() {
        let conn = test_db();
        let person = Person {
            uid: "https://alice.example/".to_string(),
            name: Some("Alice".to_string()),
            url: vec!["https://alice.example/".to_string()],
            photo: None,
            post_types: Vec::new(),
        };
        insert_person(&conn, &person).unwrap();
        assert!(insert_person(&conn, &person).is_err());
        assert_eq!(
            find_person(&conn, "https://alice.example/").unwrap(),
            Some(person)
        );
    }
}

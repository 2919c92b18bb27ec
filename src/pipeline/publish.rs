// Publish pipeline: persist a normalized entry and its references.
//
//   1. stamp `published` with server time (client values are overwritten)
//   2. turn every reference into a save: cite -> NoteContext, card -> Person
//   3. drop the reference map from the entry
//   4. save the note and all references concurrently
//
// A failed reference save is logged and counted but never fails the publish.
// A failed note save does, except that a generated (timestamp) slug which is
// already taken gets a numeric suffix and is tried again. A client's own
// `mp-slug` is never rewritten.

use anyhow::Result;
use chrono::{SubsecRound, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, warn};

use super::note::{build_note, client_slug};
use crate::config::SiteConfig;
use crate::db::models::{Note, NoteContext, Person};
use crate::db::Database;
use crate::micropub::{Entry, Reference};

/// Upper bound on `-2`, `-3`, ... suffixes tried for a generated slug.
const MAX_SLUG_SUFFIX: usize = 1000;

/// Result of a successful publish.
#[derive(Debug)]
pub struct Published {
    pub note: Note,
    /// References that were saved.
    pub references_saved: usize,
    /// References whose save failed (already logged).
    pub reference_failures: usize,
}

/// Save `entry` as a new note, along with its references.
pub async fn publish(db: &dyn Database, site: &SiteConfig, mut entry: Entry) -> Result<Published> {
    // Millisecond precision, matching what storage keeps.
    entry.published = Some(Utc::now().trunc_subsecs(3));

    let references = std::mem::take(&mut entry.references);
    let saves: Vec<BoxFuture<'_, Result<String>>> = references
        .into_iter()
        .map(|(key, reference)| reference_save(db, key, reference))
        .collect();

    let published = entry.published.unwrap_or_else(Utc::now);
    let note = build_note(&entry, site, published);
    let generated_slug = client_slug(&entry).is_none();

    let (note_result, save_results) = futures::join!(
        insert_note(db, site, note, generated_slug),
        join_all(saves)
    );
    let note = note_result?;

    let mut references_saved = 0;
    let mut reference_failures = 0;
    for result in save_results {
        match result {
            Ok(id) => {
                debug!(reference = %id, "Saved reference");
                references_saved += 1;
            }
            Err(e) => {
                warn!(error = %e, note = %note.url, "Failed to save reference");
                reference_failures += 1;
            }
        }
    }

    Ok(Published {
        note,
        references_saved,
        reference_failures,
    })
}

/// Insert the note. A taken generated slug is retried as `{slug}-2`, `{slug}-3`...
async fn insert_note(
    db: &dyn Database,
    site: &SiteConfig,
    mut note: Note,
    generated_slug: bool,
) -> Result<Note> {
    let base = note.slug.clone();
    let mut suffix = 1;
    loop {
        let err = match db.insert_note(&note).await {
            Ok(()) => return Ok(note),
            Err(e) => e,
        };
        let taken = generated_slug
            && suffix < MAX_SLUG_SUFFIX
            && db.find_note_by_slug(&note.slug).await?.is_some();
        if !taken {
            return Err(err);
        }
        suffix += 1;
        debug!(slug = %note.slug, "Generated slug taken, adding suffix");
        note.slug = format!("{base}-{suffix}");
        note.url = site.note_url(&note.slug);
    }
}

/// Build the save for one reference. Resolves to an identifier for logging.
fn reference_save(
    db: &dyn Database,
    key: String,
    reference: Reference,
) -> BoxFuture<'_, Result<String>> {
    // Snapshot the classification before the reference is consumed.
    let post_types = reference.post_types().to_vec();
    match reference {
        Reference::Cite(cite) => {
            let context = NoteContext::from_citation(&key, cite, post_types);
            async move {
                let id = db.insert_context(&context).await?;
                Ok(format!("context {id} ({})", context.url))
            }
            .boxed()
        }
        Reference::Card(card) => async move {
            let person = Person::from_card(card, post_types)?;
            db.insert_person(&person).await?;
            Ok(format!("person {}", person.uid))
        }
        .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteDatabase;
    use crate::micropub::{Card, Citation, PostType};

    fn site() -> SiteConfig {
        SiteConfig::new("https://example.com", "https://tokens.example/token")
    }

    #[tokio::test]
    async fn test_publish_overwrites_client_published() {
        let db = SqliteDatabase::in_memory().unwrap();
        let client_time = chrono::DateTime::parse_from_rfc3339("2001-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entry = Entry {
            content: Some("hello world".to_string()),
            published: Some(client_time),
            post_types: vec![PostType::Note],
            ..Default::default()
        };

        let before = Utc::now().trunc_subsecs(3);
        let published = publish(&db, &site(), entry).await.unwrap();
        assert_ne!(published.note.published, client_time);
        assert!(published.note.published >= before);

        let stored = db
            .find_note_by_slug(&published.note.slug)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.content.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn test_publish_splits_references() {
        let db = SqliteDatabase::in_memory().unwrap();
        let mut entry = Entry {
            content: Some("replying".to_string()),
            in_reply_to: vec!["https://other.example/post".to_string()],
            post_types: vec![PostType::Reply, PostType::Note],
            ..Default::default()
        };
        entry.references.insert(
            "https://other.example/post".to_string(),
            Reference::Cite(Citation {
                url: vec!["https://other.example/post".to_string()],
                name: Some("Their post".to_string()),
                post_types: vec![PostType::Article],
                ..Default::default()
            }),
        );
        entry.references.insert(
            "https://alice.example/".to_string(),
            Reference::Card(Card {
                url: vec!["https://alice.example/".to_string()],
                name: Some("Alice".to_string()),
                ..Default::default()
            }),
        );

        let published = publish(&db, &site(), entry).await.unwrap();
        assert_eq!(published.references_saved, 2);
        assert_eq!(published.reference_failures, 0);

        let contexts = db
            .find_contexts_by_url("https://other.example/post")
            .await
            .unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].post_types, vec![PostType::Article]);
        assert!(db
            .find_person("https://alice.example/")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_generated_slugs_never_collide() {
        let db = SqliteDatabase::in_memory().unwrap();
        let mut slugs = Vec::new();
        for i in 0..50 {
            let entry = Entry {
                content: Some(format!("note {i}")),
                post_types: vec![PostType::Note],
                ..Default::default()
            };
            let published = publish(&db, &site(), entry).await.unwrap();
            assert_eq!(published.note.url, site().note_url(&published.note.slug));
            slugs.push(published.note.slug);
        }

        assert_eq!(db.find_notes().await.unwrap().len(), 50);
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 50);
    }

    #[tokio::test]
    async fn test_taken_mp_slug_still_fails() {
        let db = SqliteDatabase::in_memory().unwrap();
        let entry = Entry {
            content: Some("first".to_string()),
            mp_slug: Some("same".to_string()),
            ..Default::default()
        };
        publish(&db, &site(), entry.clone()).await.unwrap();
        assert!(publish(&db, &site(), entry).await.is_err());
        assert_eq!(db.find_notes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_reference_does_not_fail_publish() {
        let db = SqliteDatabase::in_memory().unwrap();
        let mut entry = Entry {
            content: Some("tagging someone".to_string()),
            ..Default::default()
        };
        entry.references.insert(
            "Nobody".to_string(),
            Reference::Card(Card {
                name: Some("Nobody".to_string()),
                ..Default::default()
            }),
        );

        let published = publish(&db, &site(), entry).await.unwrap();
        assert_eq!(published.reference_failures, 1);
        assert!(db
            .find_note_by_slug(&published.note.slug)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_slug_fails_publish() {
        let db = SqliteDatabase::in_memory().unwrap();
        let entry = Entry {
            content: Some("first".to_string()),
            mp_slug: Some("same".to_string()),
            ..Default::default()
        };
        publish(&db, &site(), entry.clone()).await.unwrap();
        assert!(publish(&db, &site(), entry).await.is_err());
    }
}

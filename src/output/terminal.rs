// Colored terminal output for the `notes` command.

use colored::Colorize;

use crate::db::models::Note;
use crate::micropub::PostType;

/// Display stored notes, newest first.
pub fn display_notes(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes yet. Point a Micropub client at /micropub to publish one.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Notes ({}) ===", notes.len()).bold()
    );
    println!();

    for note in notes {
        let text = note
            .name
            .as_deref()
            .or(note.content.as_deref())
            .unwrap_or("");
        println!(
            "  {}  {:<9} {}",
            note.published.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            colorize_type(note.primary_type()),
            super::truncate_chars(&text.replace('\n', " "), 60),
        );
        println!("  {}", note.url.dimmed());
        if !note.mention_targets.is_empty() {
            println!(
                "  {} {}",
                "mentions:".dimmed(),
                note.mention_targets.join(", ")
            );
        }
        println!();
    }
}

fn colorize_type(post_type: PostType) -> colored::ColoredString {
    let label = post_type.as_str();
    match post_type {
        PostType::Reply => label.cyan(),
        PostType::Like | PostType::Repost | PostType::Bookmark => label.magenta(),
        PostType::Article => label.green(),
        PostType::Photo | PostType::Video => label.yellow(),
        PostType::Rsvp | PostType::Note => label.normal(),
    }
}

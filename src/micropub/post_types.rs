// Post type discovery.
//
// Response types are checked in a fixed order (rsvp, reply, repost, like,
// bookmark), then media (video, photo), and every entry ends with its base
// type: article if it has a name that isn't just the start of its content,
// note otherwise. The first element is the most specific type.

use super::jf2::{Citation, Entry, PostType, Reference};

const VALID_RSVP: [&str; 4] = ["yes", "no", "maybe", "interested"];

/// Classify an entry. Never returns an empty list.
pub fn discover(entry: &Entry) -> Vec<PostType> {
    let mut types = Vec::new();

    if entry
        .rsvp
        .as_deref()
        .is_some_and(|r| VALID_RSVP.contains(&r))
    {
        types.push(PostType::Rsvp);
    }
    if !entry.in_reply_to.is_empty() {
        types.push(PostType::Reply);
    }
    if !entry.repost_of.is_empty() {
        types.push(PostType::Repost);
    }
    if !entry.like_of.is_empty() {
        types.push(PostType::Like);
    }
    if !entry.bookmark_of.is_empty() {
        types.push(PostType::Bookmark);
    }
    if !entry.video.is_empty() {
        types.push(PostType::Video);
    }
    if !entry.photo.is_empty() {
        types.push(PostType::Photo);
    }

    types.push(base_type(entry.name.as_deref(), entry.content.as_deref()));
    types
}

/// Classify a reference. Citations get their base type; cards are people,
/// not posts, and get no types.
pub fn discover_reference(reference: &Reference) -> Vec<PostType> {
    match reference {
        Reference::Cite(Citation { name, content, .. }) => {
            vec![base_type(name.as_deref(), content.as_deref())]
        }
        Reference::Card(_) => Vec::new(),
    }
}

/// Classify an entry and all of its references in place.
pub fn classify(entry: &mut Entry) {
    entry.post_types = discover(entry);
    for reference in entry.references.values_mut() {
        let types = discover_reference(reference);
        reference.set_post_types(types);
    }
}

fn base_type(name: Option<&str>, content: Option<&str>) -> PostType {
    let name = collapse_whitespace(name.unwrap_or_default());
    if name.is_empty() {
        return PostType::Note;
    }
    let content = collapse_whitespace(content.unwrap_or_default());
    if content.starts_with(&name) {
        PostType::Note
    } else {
        PostType::Article
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

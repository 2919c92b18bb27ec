// Publishing pipeline: from a normalized entry to stored documents.

pub mod note;
pub mod publish;

pub use note::build_note;
pub use publish::{publish, Published};

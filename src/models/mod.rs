mod hackathon;
mod member;
mod profile;
mod project;

pub use hackathon::*;
pub use member::*;
pub use profile::*;
pub use project::*;

use serde::{Deserialize, Deserializer};

/// Anything with an id and a creator. Visibility and statistics are computed
/// over this.
pub trait Entity {
    fn id(&self) -> &str;
    fn created_by(&self) -> &str;
}

/// Deserialize a nullable field of a partial update.
///
/// Missing field = None (leave unchanged), `null` = Some(None) (clear),
/// value = Some(Some(v)). Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Empty or whitespace-only text counts as absent.
pub(crate) fn clear_blank(field: &mut Option<String>) {
    if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *field = None;
    }
}

pub(crate) fn check_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title is required".into());
    }
    Ok(())
}

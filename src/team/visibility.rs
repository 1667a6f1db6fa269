use crate::models::{Entity, Membership};

/// Whether `user_id` may see `entity`: they created it or are on its roster.
pub fn is_visible<E: Entity>(entity: &E, memberships: &[Membership], user_id: &str) -> bool {
    entity.created_by() == user_id
        || memberships
            .iter()
            .any(|m| m.entity_id == entity.id() && m.user_id == user_id)
}

/// Stable filter of `entities` down to those visible to `user_id`.
///
/// `memberships` must be of the same entity kind as `entities`. Input order is
/// kept; an empty membership list leaves creator-only visibility.
pub fn visible_entities<E: Entity + Clone>(
    entities: &[E],
    memberships: &[Membership],
    user_id: &str,
) -> Vec<E> {
    entities
        .iter()
        .filter(|e| is_visible(*e, memberships, user_id))
        .cloned()
        .collect()
}

//! New-comment detection against the stored baseline.

use std::collections::HashSet;

use crate::graph::Comment;

/// Comments from `current` whose identifier is present and not in `known_ids`.
///
/// Order of `current` is preserved. Comments without an identifier are never new.
#[must_use]
pub fn find_new(current: &[Comment], known_ids: &HashSet<String>) -> Vec<Comment> {
    current
        .iter()
        .filter(|comment| comment.id().is_some_and(|id| !known_ids.contains(id)))
        .cloned()
        .collect()
}

/// Merge the latest fetch with the previous snapshot's comments.
///
/// The fetched list comes first, in fetch order. Previously stored comments whose id is
/// absent from the fetch follow in their stored order, so a snapshot never loses a
/// comment it once held.
#[must_use]
pub fn merge_with_previous(current: Vec<Comment>, previous: &[Comment]) -> Vec<Comment> {
    let current_ids: HashSet<&str> = current.iter().filter_map(Comment::id).collect();
    let carried: Vec<Comment> = previous
        .iter()
        .filter(|comment| {
            comment
                .id()
                .is_some_and(|id| !current_ids.contains(id))
        })
        .cloned()
        .collect();

    let mut merged = current;
    merged.extend(carried);
    merged
}

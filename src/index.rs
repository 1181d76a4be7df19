//! Identifier indices and the generic index-then-map join.

use std::collections::HashMap;

use crate::records::Record;

/// Ephemeral mapping from record identifier to record.
pub type IdIndex<'a, R> = HashMap<i64, &'a R>;

/// Indexes records by identifier.
///
/// The service does not promise unique identifiers within a result set.
/// When two records share an identifier the later one in sequence order
/// wins.
pub fn index_by_id<'a, R, I>(records: I) -> IdIndex<'a, R>
where
    R: Record,
    I: IntoIterator<Item = &'a R>,
{
    let iter = records.into_iter();
    let mut index = HashMap::with_capacity(iter.size_hint().0);
    for record in iter {
        index.insert(record.id(), record);
    }
    index
}

/// Copies data from related records onto each target.
///
/// `key` yields the foreign identifier of a target; `apply` receives the
/// matching related record, or `None` when the identifier is not indexed.
/// Returns the number of targets whose key was found.
pub fn join_by_id<T, R, K, F>(targets: &mut [T], index: &IdIndex<'_, R>, key: K, mut apply: F) -> usize
where
    K: Fn(&T) -> i64,
    F: FnMut(&mut T, Option<&R>),
{
    let mut hits = 0;
    for target in targets.iter_mut() {
        let related = index.get(&key(target)).copied();
        if related.is_some() {
            hits += 1;
        }
        apply(target, related);
    }
    hits
}

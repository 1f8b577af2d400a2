//! List reconciliation.
//!
//! Pure, total functions that compute the next collection state for an
//! upsert or delete. Identity matching replaces in place (index
//! preserved); unmatched upserts insert per the kind's position policy;
//! unmatched removes are a no-op.

use tether_domain::{
    CookieJar, Environment, Folder, GrpcConnection, GrpcRequest, HttpRequest, HttpResponse,
    InsertPosition, KeyValue, Plugin, Workspace,
};

/// Identity and insert-position rules for one reconcilable entity type.
pub trait Identified {
    /// Where a new entry lands when no identity match exists.
    const INSERT_POSITION: InsertPosition;

    /// Whether two values refer to the same entity.
    fn same_identity(&self, other: &Self) -> bool;
}

macro_rules! identified_by_id {
    ($ty:ty, $position:expr) => {
        impl Identified for $ty {
            const INSERT_POSITION: InsertPosition = $position;

            fn same_identity(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }
    };
}

identified_by_id!(Workspace, InsertPosition::Append);
identified_by_id!(Folder, InsertPosition::Append);
identified_by_id!(HttpRequest, InsertPosition::Append);
identified_by_id!(GrpcRequest, InsertPosition::Append);
identified_by_id!(Environment, InsertPosition::Append);
identified_by_id!(CookieJar, InsertPosition::Append);
identified_by_id!(Plugin, InsertPosition::Append);
identified_by_id!(HttpResponse, InsertPosition::Prepend);
identified_by_id!(GrpcConnection, InsertPosition::Prepend);

impl Identified for KeyValue {
    const INSERT_POSITION: InsertPosition = InsertPosition::Append;

    fn same_identity(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.key == other.key
    }
}

/// Upserts `item` into `list`.
///
/// An existing entry with the same identity is replaced at its current
/// index. Otherwise the item is appended, or prepended for
/// chronological kinds (most-recent-first).
pub fn upsert<T: Identified>(list: &mut Vec<T>, item: T) {
    match list.iter().position(|existing| existing.same_identity(&item)) {
        Some(index) => list[index] = item,
        None => match T::INSERT_POSITION {
            InsertPosition::Append => list.push(item),
            InsertPosition::Prepend => list.insert(0, item),
        },
    }
}

/// Removes the entry matching `item`'s identity, if present.
pub fn remove<T: Identified>(list: &mut Vec<T>, item: &T) {
    list.retain(|existing| !existing.same_identity(item));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn request(workspace_id: &str, name: &str) -> HttpRequest {
        HttpRequest::new(workspace_id, name)
    }

    #[test]
    fn test_upsert_appends_new_entries() {
        let mut list = vec![request("wk1", "a"), request("wk1", "b")];
        let c = request("wk1", "c");
        upsert(&mut list, c.clone());
        assert_eq!(list.len(), 3);
        assert_eq!(list[2], c);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut list = vec![request("wk1", "a"), request("wk1", "b"), request("wk1", "c")];
        let mut updated = list[1].clone();
        updated.name = "renamed".to_string();
        upsert(&mut list, updated.clone());
        assert_eq!(list.len(), 3);
        assert_eq!(list[1], updated);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut once = vec![request("wk1", "a")];
        let b = request("wk1", "b");
        upsert(&mut once, b.clone());
        let mut twice = once.clone();
        upsert(&mut twice, b);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_chronological_kinds_prepend() {
        let mut list = vec![HttpResponse::new("wk1", "rq1")];
        let newest = HttpResponse::new("wk1", "rq1");
        upsert(&mut list, newest.clone());
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], newest);
    }

    #[test]
    fn test_key_value_compound_identity() {
        let mut list = vec![KeyValue::new("global", "width", "200")];
        upsert(&mut list, KeyValue::new("global", "width", "350"));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].value, "350");

        // Same key in a different namespace is a different entry
        upsert(&mut list, KeyValue::new("no_sync", "width", "100"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_is_idempotent_on_absent() {
        let mut list = vec![request("wk1", "a")];
        let never_added = request("wk1", "b");
        remove(&mut list, &never_added);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_filters_by_identity() {
        let a = request("wk1", "a");
        let b = request("wk1", "b");
        let mut list = vec![a.clone(), b.clone()];
        let mut stale_copy = a.clone();
        stale_copy.name = "stale name".to_string();
        remove(&mut list, &stale_copy);
        assert_eq!(list, vec![b]);
    }
}

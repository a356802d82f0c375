//! Fallback composite over an ordered list of stores.
//!
//! [`AggregatePropertyStore`] presents several stores as one. Members are
//! consulted in insertion order and the first one that answers wins. The
//! composite is built for fault tolerance: a member that fails during a
//! read, existence check, kind probe, key listing or single-key removal is
//! skipped and the next member is tried. Only `remove_all` is strict.
//!
//! Numeric reads treat a stored zero like an absent key and keep searching,
//! and boolean reads confirm a `false` with `exists`. As a consequence a
//! zero held by a lower-precedence member is only visible when no member
//! holds a nonzero value for the key, and falls back to the default
//! otherwise.

use std::sync::Arc;

use propset_types::{Kind, Value};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::PropertyStore;

/// Outcome of asking one member for a value.
#[derive(Debug)]
enum Probe {
    /// The member answered with a value that ends the search.
    Found(Value),
    /// The member has nothing conclusive; try the next one.
    Absent,
    /// The member failed; the error is logged and the search continues.
    Failed(StoreError),
}

/// Store composed of other stores, with first-responder-wins semantics.
///
/// The composite holds no entries of its own. Members are shared handles:
/// the same store may sit in several composites or decorators.
#[derive(Clone, Default)]
pub struct AggregatePropertyStore {
    members: Vec<Arc<dyn PropertyStore>>,
}

impl AggregatePropertyStore {
    /// Create a composite. The first member has the highest precedence.
    pub fn new(members: Vec<Arc<dyn PropertyStore>>) -> Self {
        Self { members }
    }

    /// Append a member with the lowest precedence.
    pub fn add_store(&mut self, store: Arc<dyn PropertyStore>) {
        self.members.push(store);
    }

    /// Builder form of [`add_store`](Self::add_store).
    pub fn with_store(mut self, store: Arc<dyn PropertyStore>) -> Self {
        self.add_store(store);
        self
    }

    pub fn members(&self) -> &[Arc<dyn PropertyStore>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Ask one member for `key` as `kind`, applying the per-kind rules.
    fn probe(member: &dyn PropertyStore, kind: Kind, key: &str) -> Probe {
        let value = match member.get_typed(kind, key) {
            Ok(value) => value,
            Err(e) => return Probe::Failed(e),
        };
        match kind {
            Kind::Boolean => match value {
                Some(Value::Boolean(true)) => Probe::Found(Value::Boolean(true)),
                // `false` and "absent" look the same; only `exists` tells them apart.
                _ => match member.exists(key) {
                    Ok(true) => Probe::Found(Value::Boolean(false)),
                    Ok(false) => Probe::Absent,
                    Err(e) => Probe::Failed(e),
                },
            },
            Kind::Int | Kind::Long | Kind::Double => match value {
                Some(v) if !v.is_zero_numeric() => Probe::Found(v),
                Some(_) => {
                    debug!(key, %kind, "zero value treated as absent");
                    Probe::Absent
                }
                None => Probe::Absent,
            },
            Kind::String | Kind::Text | Kind::Date | Kind::Object => match value {
                Some(v) => Probe::Found(v),
                None => Probe::Absent,
            },
        }
    }
}

impl PropertyStore for AggregatePropertyStore {
    /// First conclusive answer wins. Returns `Ok(None)` when no member
    /// answers, including when every member fails.
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        for (index, member) in self.members.iter().enumerate() {
            match Self::probe(member.as_ref(), kind, key) {
                Probe::Found(value) => return Ok(Some(value)),
                Probe::Absent => {}
                Probe::Failed(e) => {
                    debug!(member = index, key, error = %e, "skipping failed member on read");
                }
            }
        }
        Ok(None)
    }

    /// Writes go to the first settable member that accepts them, never to
    /// more than one. A member that refuses is skipped; if every settable
    /// member refuses, the last refusal is returned.
    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()> {
        value
            .check_constraints()
            .map_err(|e| StoreError::illegal(key, e))?;

        let mut last_error = None;
        for (index, member) in self.members.iter().enumerate() {
            if !member.is_settable(key) {
                continue;
            }
            match member.set_typed(key, value.clone()) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!(member = index, key, error = %e, "member rejected write, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| StoreError::NotSettable {
            key: key.to_string(),
        }))
    }

    /// Kind reported by the first member that answers without error, even
    /// when that answer is "absent". Fails with [`StoreError::KeyNotFound`]
    /// only if every member fails.
    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>> {
        for (index, member) in self.members.iter().enumerate() {
            match member.get_kind(key) {
                Ok(kind) => return Ok(kind),
                Err(e) => {
                    debug!(member = index, key, error = %e, "skipping failed member on kind lookup");
                }
            }
        }
        Err(StoreError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Concatenation of every member's keys, in member order. Keys held by
    /// several members appear once per member.
    fn keys(&self, prefix: Option<&str>, kind: Option<Kind>) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for (index, member) in self.members.iter().enumerate() {
            match member.keys(prefix, kind) {
                Ok(mut member_keys) => keys.append(&mut member_keys),
                Err(e) => {
                    debug!(member = index, error = %e, "skipping failed member on key listing");
                }
            }
        }
        Ok(keys)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        for (index, member) in self.members.iter().enumerate() {
            match member.exists(key) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    debug!(member = index, key, error = %e, "skipping failed member on exists");
                }
            }
        }
        Ok(false)
    }

    /// Best-effort removal from every member.
    fn remove(&self, key: &str) -> StoreResult<()> {
        for (index, member) in self.members.iter().enumerate() {
            if let Err(e) = member.remove(key) {
                debug!(member = index, key, error = %e, "member failed to remove key");
            }
        }
        Ok(())
    }

    /// Clears members in order. The first failure aborts and propagates;
    /// later members are left untouched.
    fn remove_all(&self) -> StoreResult<()> {
        for member in &self.members {
            member.remove_all()?;
        }
        Ok(())
    }

    fn is_settable(&self, key: &str) -> bool {
        self.members.iter().any(|m| m.is_settable(key))
    }

    fn supports_kind(&self, kind: Kind) -> bool {
        self.members.iter().any(|m| m.supports_kind(kind))
    }

    fn supports_any_kind(&self) -> bool {
        self.members.iter().any(|m| m.supports_any_kind())
    }
}

impl std::fmt::Debug for AggregatePropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatePropertyStore")
            .field("member_count", &self.members.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPropertyStore;
    use crate::test_support::{CountingStore, Failure, FailingStore};
    use chrono::{TimeZone, Utc};
    use propset_types::PropertyObject;
    use std::sync::atomic::Ordering;

    type Member = Arc<dyn PropertyStore>;

    fn memory() -> Arc<MemoryPropertyStore> {
        Arc::new(MemoryPropertyStore::new())
    }

    fn aggregate(members: Vec<Arc<dyn PropertyStore>>) -> AggregatePropertyStore {
        AggregatePropertyStore::new(members)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[test]
    fn failing_first_member_is_skipped() {
        let a = Arc::new(FailingStore::new(Failure::KeyNotFound));
        let b = memory();
        b.set_int("k", 5).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(agg.get_int("k").unwrap(), 5);
        assert_eq!(agg.get_typed(Kind::Int, "k").unwrap(), Some(Value::Int(5)));
    }

    #[test]
    fn zero_in_first_member_falls_through_to_nonzero() {
        let a = memory();
        let b = memory();
        a.set_int("k", 0).unwrap();
        b.set_int("k", 7).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(agg.get_int("k").unwrap(), 7);
    }

    #[test]
    fn zero_only_member_reads_as_absent() {
        let a = memory();
        a.set_long("k", 0).unwrap();
        a.set_double("d", 0.0).unwrap();
        let agg = aggregate(vec![a as Member]);
        assert_eq!(agg.get_typed(Kind::Long, "k").unwrap(), None);
        assert_eq!(agg.get_typed(Kind::Double, "d").unwrap(), None);
        assert_eq!(agg.get_long("k").unwrap(), 0);
    }

    #[test]
    fn higher_precedence_nonzero_wins() {
        let a = memory();
        let b = memory();
        a.set_double("ratio", 0.25).unwrap();
        b.set_double("ratio", 0.75).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(agg.get_double("ratio").unwrap(), 0.25);
    }

    #[test]
    fn stored_false_stops_the_search() {
        let a = memory();
        let b = memory();
        a.set_bool("flag", false).unwrap();
        b.set_bool("flag", true).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(
            agg.get_typed(Kind::Boolean, "flag").unwrap(),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn absent_boolean_falls_through() {
        let a = memory();
        let b = memory();
        b.set_bool("flag", true).unwrap();
        let agg = aggregate(vec![a.clone() as Member, b]);
        assert!(agg.get_bool("flag").unwrap());

        let agg = aggregate(vec![a as Member]);
        assert_eq!(agg.get_typed(Kind::Boolean, "flag").unwrap(), None);
    }

    #[test]
    fn first_non_null_string_wins() {
        let a = memory();
        let b = memory();
        let c = memory();
        b.set_string("name", "second").unwrap();
        c.set_string("name", "third").unwrap();
        let agg = aggregate(vec![a as Member, b, c]);
        assert_eq!(agg.get_string("name").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn date_and_object_fall_through_empty_first_member() {
        let a = memory();
        let b = memory();
        let when = Utc.with_ymd_and_hms(2023, 4, 5, 6, 7, 8).unwrap();
        b.set_date("created", when).unwrap();
        b.set_object("limits", serde_json::json!({"cpu": 4}).into())
            .unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(agg.get_date("created").unwrap(), Some(when));
        assert_eq!(
            agg.get_object("limits").unwrap(),
            Some(PropertyObject::Json(serde_json::json!({"cpu": 4})))
        );
        assert_eq!(agg.get_date("missing").unwrap(), None);
    }

    #[test]
    fn first_non_null_date_wins() {
        let a = memory();
        let b = memory();
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        a.set_date("d", early).unwrap();
        b.set_date("d", late).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(agg.get_date("d").unwrap(), Some(early));
    }

    #[test]
    fn kind_mismatch_in_member_is_skipped() {
        let a = memory();
        let b = memory();
        a.set_string("port", "eighty").unwrap();
        b.set_int("port", 80).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(agg.get_int("port").unwrap(), 80);
    }

    #[test]
    fn read_with_every_member_failing_is_absent() {
        let agg = aggregate(vec![
            Arc::new(FailingStore::new(Failure::Backend)) as Member,
            Arc::new(FailingStore::new(Failure::KeyNotFound)),
        ]);
        assert_eq!(agg.get_typed(Kind::String, "x").unwrap(), None);
        assert_eq!(agg.get_int("x").unwrap(), 0);
        assert!(!agg.exists("x").unwrap());
    }

    #[test]
    fn empty_composite_reads_nothing() {
        let agg = AggregatePropertyStore::default();
        assert!(agg.is_empty());
        assert_eq!(agg.get_typed(Kind::Date, "x").unwrap(), None);
        assert!(agg.all_keys().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Exists / kind probe
    // -----------------------------------------------------------------------

    #[test]
    fn exists_checks_members_in_order() {
        let a = Arc::new(FailingStore::new(Failure::Backend));
        let b = memory();
        b.set_text("t", "x").unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert!(agg.exists("t").unwrap());
        assert!(!agg.exists("u").unwrap());
    }

    #[test]
    fn kind_comes_from_first_answering_member() {
        let a = Arc::new(FailingStore::new(Failure::Backend));
        let b = memory();
        let c = memory();
        b.set_int("k", 1).unwrap();
        c.set_string("k", "s").unwrap();
        let agg = aggregate(vec![a as Member, b, c]);
        assert_eq!(agg.get_kind("k").unwrap(), Some(Kind::Int));
        assert_eq!(agg.get_kind("missing").unwrap(), None);
    }

    #[test]
    fn absent_answer_ends_the_kind_search() {
        let a = memory();
        let b = memory();
        b.set_int("k", 5).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(agg.get_kind("k").unwrap(), None);
    }

    #[test]
    fn actual_kind_read_follows_the_kind_answer() {
        let a = memory();
        let b = memory();
        a.set_text("motd", "hello").unwrap();
        b.set_text("banner", "hi").unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(
            agg.get_as_actual_kind("motd").unwrap(),
            Some(Value::Text("hello".into()))
        );
        // `a` answers "absent" for `banner`, so no kind is found for it.
        assert_eq!(agg.get_as_actual_kind("banner").unwrap(), None);
    }

    #[test]
    fn kind_probe_fails_when_every_member_fails() {
        let agg = aggregate(vec![Arc::new(FailingStore::new(Failure::Backend)) as Member]);
        assert!(matches!(
            agg.get_kind("k"),
            Err(StoreError::KeyNotFound { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    #[test]
    fn write_goes_to_first_settable_member_only() {
        let a = memory();
        let b = memory();
        let agg = aggregate(vec![a.clone() as Member, b.clone()]);
        agg.set_int("k", 9).unwrap();
        assert_eq!(a.get_int("k").unwrap(), 9);
        assert!(!b.exists("k").unwrap());
    }

    #[test]
    fn unsettable_members_are_passed_over() {
        let a = Arc::new(FailingStore::new(Failure::Backend));
        let b = memory();
        let agg = aggregate(vec![a as Member, b.clone()]);
        agg.set_string("k", "v").unwrap();
        assert_eq!(b.get_string("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn failed_write_moves_on_to_next_settable_member() {
        let a = memory();
        let b = memory();
        a.set_int("k", 1).unwrap();
        let agg = aggregate(vec![a.clone() as Member, b.clone()]);
        // `a` holds `k` as INT, so a STRING write there is a duplicate key.
        agg.set_string("k", "text").unwrap();
        assert_eq!(a.get_int("k").unwrap(), 1);
        assert_eq!(b.get_string("k").unwrap().as_deref(), Some("text"));
    }

    #[test]
    fn last_error_propagates_when_every_write_fails() {
        let a = Arc::new(FailingStore::new(Failure::KeyNotFound).settable());
        let b = Arc::new(FailingStore::new(Failure::Backend).settable());
        let agg = aggregate(vec![a as Member, b]);
        assert!(matches!(
            agg.set_int("k", 1),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn write_without_settable_member_is_refused() {
        let agg = aggregate(vec![Arc::new(FailingStore::new(Failure::Backend)) as Member]);
        assert!(!agg.is_settable("k"));
        assert!(matches!(
            agg.set_bool("k", true),
            Err(StoreError::NotSettable { .. })
        ));
    }

    #[test]
    fn long_string_rejected_before_any_member() {
        let a = memory();
        let agg = aggregate(vec![a.clone() as Member]);
        assert!(matches!(
            agg.set_string("k", &"s".repeat(256)),
            Err(StoreError::IllegalValue { .. })
        ));
        assert!(!a.exists("k").unwrap());
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    #[test]
    fn keys_are_concatenated_without_dedup() {
        let a = memory();
        let b = memory();
        a.set_int("shared", 1).unwrap();
        a.set_int("a.only", 1).unwrap();
        b.set_int("shared", 2).unwrap();
        b.set_string("b.only", "x").unwrap();
        let agg = aggregate(vec![a as Member, Arc::new(FailingStore::new(Failure::Backend)), b]);
        assert_eq!(
            agg.all_keys().unwrap(),
            vec!["a.only", "shared", "b.only", "shared"]
        );
        assert_eq!(agg.keys_of_kind(Kind::Int).unwrap(), vec!["a.only", "shared", "shared"]);
    }

    #[test]
    fn prefix_listing_spans_members_with_duplicates() {
        let a = memory();
        let b = memory();
        a.set_string("db.host", "primary").unwrap();
        a.set_int("cache.size", 64).unwrap();
        b.set_string("db.host", "replica").unwrap();
        b.set_int("db.port", 5432).unwrap();
        let agg = aggregate(vec![a as Member, b]);
        assert_eq!(
            agg.keys_with_prefix("db.").unwrap(),
            vec!["db.host", "db.host", "db.port"]
        );
        assert_eq!(
            agg.keys(Some("db."), Some(Kind::Int)).unwrap(),
            vec!["db.port"]
        );
        assert!(agg.keys_with_prefix("none.").unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    #[test]
    fn remove_is_best_effort_on_every_member() {
        let a = memory();
        let b = memory();
        a.set_int("k", 1).unwrap();
        b.set_int("k", 2).unwrap();
        let agg = aggregate(vec![
            a.clone() as Member,
            Arc::new(FailingStore::new(Failure::Backend)),
            b.clone(),
        ]);
        agg.remove("k").unwrap();
        assert!(!a.exists("k").unwrap());
        assert!(!b.exists("k").unwrap());
    }

    #[test]
    fn remove_all_stops_at_first_failure() {
        let a = Arc::new(FailingStore::new(Failure::Backend));
        let b = Arc::new(CountingStore::new());
        b.set_int("k", 1).unwrap();
        let agg = aggregate(vec![a.clone() as Member, b.clone()]);

        assert!(agg.remove_all().is_err());
        assert_eq!(a.remove_all_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.remove_all_calls(), 0);
        assert!(b.exists("k").unwrap());
    }

    #[test]
    fn remove_all_clears_every_member() {
        let a = memory();
        let b = memory();
        a.set_int("x", 1).unwrap();
        b.set_int("y", 1).unwrap();
        let agg = aggregate(vec![a.clone() as Member, b.clone()]);
        agg.remove_all().unwrap();
        assert!(a.is_empty().unwrap());
        assert!(b.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    #[test]
    fn add_store_appends_with_lowest_precedence() {
        let a = memory();
        let b = memory();
        a.set_string("k", "first").unwrap();
        b.set_string("k", "second").unwrap();
        b.set_string("fallback", "only-b").unwrap();
        let mut agg = aggregate(vec![a as Member]);
        agg.add_store(b);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.get_string("k").unwrap().as_deref(), Some("first"));
        assert_eq!(agg.get_string("fallback").unwrap().as_deref(), Some("only-b"));
    }

    #[test]
    fn composites_nest() {
        let inner_a = memory();
        let inner_b = memory();
        inner_b.set_long("deep", 42).unwrap();
        let inner: Arc<dyn PropertyStore> =
            Arc::new(aggregate(vec![inner_a as Member, inner_b]));
        let outer = AggregatePropertyStore::default()
            .with_store(memory())
            .with_store(inner);
        assert_eq!(outer.get_long("deep").unwrap(), 42);
    }

    #[test]
    fn capabilities_reflect_members() {
        let agg = aggregate(vec![memory() as Member]);
        assert!(agg.is_settable("k"));
        assert!(agg.supports_kind(Kind::Object));
        assert!(agg.supports_any_kind());
        assert!(!AggregatePropertyStore::default().supports_any_kind());
    }
}

//! Bulk operations across stores.

use propset_types::PropertyEntry;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::PropertyStore;

/// Copy every property of `src` into `dest`, returning the number copied.
///
/// Each key is read with [`PropertyStore::get_as_actual_kind`] and written
/// with [`PropertyStore::set_typed`], so the destination keeps the source's
/// kind (a short TEXT stays TEXT). Keys whose kind cannot be determined or
/// whose value reads back as absent are skipped. The first failing read or
/// write aborts the copy.
pub fn copy_properties<S, D>(src: &S, dest: &D) -> StoreResult<usize>
where
    S: PropertyStore + ?Sized,
    D: PropertyStore + ?Sized,
{
    let mut copied = 0;
    for key in src.all_keys()? {
        match src.get_as_actual_kind(&key)? {
            Some(value) => {
                dest.set_typed(&key, value)?;
                copied += 1;
            }
            None => debug!(key = %key, "skipping key without a readable value"),
        }
    }
    Ok(copied)
}

/// Every readable property of `store`, in the store's key order.
pub fn collect_entries<S: PropertyStore + ?Sized>(store: &S) -> StoreResult<Vec<PropertyEntry>> {
    let mut entries = Vec::new();
    for key in store.all_keys()? {
        if let Some(value) = store.get_as_actual_kind(&key)? {
            entries.push(PropertyEntry::new(key, value));
        }
    }
    Ok(entries)
}

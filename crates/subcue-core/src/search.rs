//! Binary search over a begin-time sorted, non-overlapping entry store.
//!
//! Every routine inspects the midpoint entry of a shrinking `[start, end]`
//! window. When the instant is before the midpoint, the previous entry is
//! checked to see whether the instant sits in the gap between the two;
//! symmetrically for "after". Bounds are inclusive: an instant equal to a
//! `begin_ms` or `end_ms` belongs to that entry.
//!
//! Two gap policies exist. Direct lookups ([`locate_index`], [`locate`])
//! report nothing for an instant in a gap. Drift correction
//! ([`nearest_index`], [`correction_index`]) resolves a gap to the earlier
//! of the two neighbouring entries so the caller can schedule a wait for
//! the next one.

use std::ops::RangeInclusive;

use crate::entry::{Entry, EntryStore, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GapPolicy {
    Strict,
    Earlier,
}

/// Index of the entry containing `instant`, or `None`.
pub fn locate_index<S: EntryStore + ?Sized>(store: &S, instant: Millis) -> Option<usize> {
    let last = store.count().checked_sub(1)?;
    bisect(store, 0, last, instant, GapPolicy::Strict)
}

/// The entry containing `instant`, or `None`.
pub fn locate<S: EntryStore + ?Sized>(store: &S, instant: Millis) -> Option<&Entry> {
    locate_index(store, instant).and_then(|index| store.get(index))
}

/// Like [`locate_index`], but an instant inside a gap resolves to the entry
/// before the gap. Still `None` before the first entry or after the last.
pub fn nearest_index<S: EntryStore + ?Sized>(store: &S, instant: Millis) -> Option<usize> {
    let last = store.count().checked_sub(1)?;
    bisect(store, 0, last, instant, GapPolicy::Earlier)
}

/// Bounded drift-correction search over `range`, preferring the earlier
/// neighbour for an instant in a gap.
///
/// # Panics
///
/// Panics when `range` is inverted or reaches past the end of the store.
/// The director computes these bounds from its own index bookkeeping, so a
/// bad range is a logic defect rather than a data condition.
pub fn correction_index<S: EntryStore + ?Sized>(
    store: &S,
    range: RangeInclusive<usize>,
    instant: Millis,
) -> Option<usize> {
    let (start, end) = range.into_inner();
    assert!(
        start <= end && end < store.count(),
        "invariant violation: correction search over [{start}, {end}] with {} entries",
        store.count()
    );
    bisect(store, start, end, instant, GapPolicy::Earlier)
}

fn bisect<S: EntryStore + ?Sized>(
    store: &S,
    start: usize,
    end: usize,
    instant: Millis,
    policy: GapPolicy,
) -> Option<usize> {
    // Half-open window so `end` never underflows.
    let mut lo = start;
    let mut hi = end + 1;
    while lo < hi {
        let middle = lo + (hi - lo) / 2;
        let entry = store.get(middle)?;
        if entry.contains(instant) {
            return Some(middle);
        }
        if instant < entry.begin_ms {
            if middle > lo {
                let previous = store.get(middle - 1)?;
                if previous.end_ms < instant {
                    return resolve_gap(middle - 1, policy);
                }
            }
            hi = middle;
        } else {
            if middle + 1 < hi {
                let next = store.get(middle + 1)?;
                if next.begin_ms > instant {
                    return resolve_gap(middle, policy);
                }
            }
            lo = middle + 1;
        }
    }
    None
}

fn resolve_gap(earlier: usize, policy: GapPolicy) -> Option<usize> {
    match policy {
        GapPolicy::Strict => None,
        GapPolicy::Earlier => Some(earlier),
    }
}

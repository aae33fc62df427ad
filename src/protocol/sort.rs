//! Tag ordering by index permutation.
//!
//! Tags are serialized sorted by key. Rather than moving tag strings around,
//! the sorter fills a reusable index array and reorders only that.

use std::cmp::Ordering;

/// Fill `order` with `0..count` sorted ascending by `key_of(index)`.
///
/// Keys compare as plain byte strings. Duplicate keys may come out in
/// either relative order.
pub fn sort_by_key<'a, F>(order: &mut Vec<usize>, count: usize, key_of: F)
where
    F: Fn(usize) -> &'a str,
{
    order.clear();
    order.extend(0..count);
    order.sort_unstable_by(|&a, &b| compare_keys(key_of(a), key_of(b)));
}

#[inline]
fn compare_keys(a: &str, b: &str) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

//! Stable merge sort, binary search, and a memoized hotel-sort wrapper.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::cache::{CacheRegistry, TrackedCache};
use crate::model::Hotel;

/// Stable divide-and-conquer sort. Produces a new Vec; the input is never
/// mutated. Ties keep their original relative order.
pub fn merge_sort<T, F>(list: &[T], cmp: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    sort_slice(list, &cmp)
}

fn sort_slice<T, F>(list: &[T], cmp: &F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    if list.len() <= 1 {
        return list.to_vec();
    }
    let middle = list.len() / 2;
    let left = sort_slice(&list[..middle], cmp);
    let right = sort_slice(&list[middle..], cmp);
    merge(&left, &right, cmp)
}

/// Two-pointer merge of two sorted runs; ties favor the left run, which is
/// what keeps the sort stable.
pub fn merge<T, F>(left: &[T], right: &[T], cmp: &F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let mut result = Vec::with_capacity(left.len() + right.len());
    let mut li = 0;
    let mut ri = 0;
    while li < left.len() && ri < right.len() {
        if cmp(&left[li], &right[ri]) != Ordering::Greater {
            result.push(left[li].clone());
            li += 1;
        } else {
            result.push(right[ri].clone());
            ri += 1;
        }
    }
    result.extend_from_slice(&left[li..]);
    result.extend_from_slice(&right[ri..]);
    result
}

/// Binary search over a list pre-sorted under the same comparator. Returns
/// the index of some element comparing equal to `key` — under duplicates
/// the leftmost match is not guaranteed.
pub fn binary_search<T, F>(sorted: &[T], key: &T, cmp: F) -> Option<usize>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut low = 0;
    let mut high = sorted.len();
    while low < high {
        let mid = (low + high) / 2;
        match cmp(&sorted[mid], key) {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
            Ordering::Equal => return Some(mid),
        }
    }
    None
}

pub fn by_name(a: &Hotel, b: &Hotel) -> Ordering {
    a.name.cmp(&b.name)
}

pub fn by_rating_descending(a: &Hotel, b: &Hotel) -> Ordering {
    b.rating.cmp(&a.rating)
}

/// Hotels sorted by name, ascending.
pub fn sort_hotels_by_name(hotels: &[Hotel]) -> Vec<Hotel> {
    merge_sort(hotels, by_name)
}

/// Hotels sorted by rating, descending.
pub fn sort_hotels_by_rating(hotels: &[Hotel]) -> Vec<Hotel> {
    merge_sort(hotels, by_rating_descending)
}

/// Binary search by hotel name. The list must already be sorted with
/// [`sort_hotels_by_name`].
pub fn search_hotel_by_name(sorted: &[Hotel], name: &str) -> Option<usize> {
    let mut low = 0;
    let mut high = sorted.len();
    while low < high {
        let mid = (low + high) / 2;
        match sorted[mid].name.as_str().cmp(name) {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
            Ordering::Equal => return Some(mid),
        }
    }
    None
}

/// A stable description of a hotel sort, usable as a cache key.
///
/// Whole-sort memoization is keyed on `(SortOrder, content hash)` rather
/// than on comparator identity: Rust closures have no identity worth keying
/// on, and an identity key would make the cache miss on every logically
/// identical request built from a fresh closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    NameAscending,
    RatingDescending,
}

/// Memoizing wrapper over the hotel sorts. The backing cache is registered
/// with the store's [`CacheRegistry`], so booking-driven eviction passes
/// cover sorted results too.
pub struct MemoSorter {
    cache: TrackedCache<(SortOrder, u64), Vec<Hotel>>,
}

impl MemoSorter {
    pub fn new(registry: &CacheRegistry) -> Self {
        Self {
            cache: registry.register("hotel_sorts"),
        }
    }

    pub fn sort(&self, hotels: &[Hotel], order: SortOrder) -> Vec<Hotel> {
        let key = (order, content_key(hotels));
        if let Some(sorted) = self.cache.get(&key) {
            return sorted;
        }
        let sorted = match order {
            SortOrder::NameAscending => sort_hotels_by_name(hotels),
            SortOrder::RatingDescending => sort_hotels_by_rating(hotels),
        };
        self.cache.insert(key, sorted.clone());
        sorted
    }

    #[cfg(test)]
    pub fn cached_sorts(&self) -> usize {
        self.cache.len()
    }
}

/// Hash of the sort-relevant content of the input, in input order.
fn content_key(hotels: &[Hotel]) -> u64 {
    let mut hasher = DefaultHasher::new();
    hotels.len().hash(&mut hasher);
    for hotel in hotels {
        hotel.id.hash(&mut hasher);
        hotel.name.hash(&mut hasher);
        hotel.rating.hash(&mut hasher);
    }
    hasher.finish()
}

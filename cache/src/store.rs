use crate::entry::Node;

use core::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::mem;

use equivalent::Equivalent;
use generational_arena::{Arena, Index};

/// The smallest bucket table the store will allocate.
pub(crate) const MIN_BUCKETS: usize = 16;

/// The largest bucket table the store will grow to. Past this point chains
/// simply get longer.
pub(crate) const MAX_BUCKETS: usize = 1 << 30;

/// A helper function to hash a key using a `BuildHasher`.
#[inline]
pub(crate) fn hash_key<Q: Hash + ?Sized, H: BuildHasher>(hasher: &H, key: &Q) -> u64 {
  let mut state = hasher.build_hasher();
  key.hash(&mut state);
  state.finish()
}

/// The bucket count needed to hold `capacity` entries under `load_factor`.
pub(crate) fn buckets_for(capacity: usize, load_factor: f64) -> usize {
  let wanted = (capacity as f64 / load_factor).ceil();
  let wanted = if wanted >= MAX_BUCKETS as f64 {
    MAX_BUCKETS
  } else {
    wanted as usize
  };
  wanted.clamp(MIN_BUCKETS, MAX_BUCKETS).next_power_of_two()
}

/// The largest initial capacity the bucket table can be sized for under
/// `load_factor`.
pub(crate) fn max_initial_capacity(load_factor: f64) -> usize {
  (MAX_BUCKETS as f64 * load_factor) as usize
}

#[inline]
fn grow_threshold(buckets: usize, load_factor: f64) -> usize {
  if buckets >= MAX_BUCKETS {
    return usize::MAX;
  }
  ((buckets as f64 * load_factor) as usize).max(1)
}

/// The physical storage behind an expiring map.
///
/// All nodes live in a single arena. Each bucket holds the head of a chain
/// linked through `next_in_bucket`, and every node is also threaded onto an
/// age list ordered by non-decreasing `inserted_at`. The store knows nothing
/// about TTLs; it only guarantees the ordering so that the caller can find
/// every expired node at the old end of the age list.
pub(crate) struct Store<K, V, H> {
  nodes: Arena<Node<K, V>>,
  buckets: Box<[Option<Index>]>,
  oldest: Option<Index>,
  newest: Option<Index>,
  load_factor: f64,
  grow_at: usize,
  hasher: H,
}

impl<K, V, H> fmt::Debug for Store<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Store")
      .field("len", &self.nodes.len())
      .field("buckets", &self.buckets.len())
      .field("load_factor", &self.load_factor)
      .finish()
  }
}

impl<K, V, H> Store<K, V, H> {
  /// Creates a store sized for `initial_capacity` entries.
  pub(crate) fn new(initial_capacity: usize, load_factor: f64, hasher: H) -> Self {
    let bucket_count = buckets_for(initial_capacity, load_factor);
    let grow_at = grow_threshold(bucket_count, load_factor);
    Self {
      nodes: Arena::with_capacity(initial_capacity.min(grow_at)),
      buckets: vec![None; bucket_count].into_boxed_slice(),
      oldest: None,
      newest: None,
      load_factor,
      grow_at,
      hasher,
    }
  }

  /// The number of physically stored nodes, expired or not.
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub(crate) fn bucket_count(&self) -> usize {
    self.buckets.len()
  }

  #[inline]
  pub(crate) fn hasher(&self) -> &H {
    &self.hasher
  }

  #[inline]
  fn bucket_index(&self, hash: u64) -> usize {
    // Bucket count is always a power of two.
    hash as usize & (self.buckets.len() - 1)
  }

  #[inline]
  pub(crate) fn node(&self, index: Index) -> &Node<K, V> {
    &self.nodes[index]
  }

  /// The node with the smallest `inserted_at`.
  #[inline]
  pub(crate) fn oldest(&self) -> Option<Index> {
    self.oldest
  }

  /// The node with the largest `inserted_at`.
  #[inline]
  pub(crate) fn newest(&self) -> Option<Index> {
    self.newest
  }

  /// Scans the chain for `hash`, comparing keys by equivalence.
  pub(crate) fn find<Q>(&self, hash: u64, key: &Q) -> Option<Index>
  where
    Q: Equivalent<K> + ?Sized,
  {
    let mut cursor = self.buckets[self.bucket_index(hash)];
    while let Some(index) = cursor {
      let node = &self.nodes[index];
      if node.hash == hash && key.equivalent(&node.key) {
        return Some(index);
      }
      cursor = node.next_in_bucket;
    }
    None
  }

  /// Stores a new node. The caller guarantees the key is not already present.
  pub(crate) fn insert(&mut self, key: K, value: V, hash: u64, now: u64) -> Index {
    if self.nodes.len() >= self.grow_at {
      self.grow();
    }

    let index = self.nodes.insert(Node::new(key, value, hash, now));
    let bucket = self.bucket_index(hash);
    self.nodes[index].next_in_bucket = self.buckets[bucket];
    self.buckets[bucket] = Some(index);
    self.link_by_age(index);
    index
  }

  /// Replaces the value of an existing node and restamps it with `now`.
  /// Returns the old value.
  pub(crate) fn rewrite(&mut self, index: Index, value: V, now: u64) -> V {
    self.unlink_from_age_list(index);
    let node = &mut self.nodes[index];
    node.inserted_at = now;
    let old = mem::replace(&mut node.value, value);
    self.link_by_age(index);
    old
  }

  /// Unlinks a node from its chain and the age list and frees its slot.
  pub(crate) fn remove(&mut self, index: Index) -> Option<Node<K, V>> {
    if !self.nodes.contains(index) {
      return None;
    }
    self.unlink_from_bucket(index);
    self.unlink_from_age_list(index);
    self.nodes.remove(index)
  }

  /// Drops every node, keeping the current bucket table.
  pub(crate) fn clear(&mut self) {
    self.nodes.clear();
    self.buckets.iter_mut().for_each(|head| *head = None);
    self.oldest = None;
    self.newest = None;
  }

  /// Iterates nodes from oldest to newest.
  pub(crate) fn iter_by_age(&self) -> AgeIter<'_, K, V> {
    AgeIter {
      nodes: &self.nodes,
      front: self.oldest,
      back: self.newest,
      remaining: self.nodes.len(),
    }
  }

  // Removes `index` from its bucket chain without touching the arena.
  fn unlink_from_bucket(&mut self, index: Index) {
    let (hash, next) = {
      let node = &self.nodes[index];
      (node.hash, node.next_in_bucket)
    };
    let bucket = self.bucket_index(hash);

    if self.buckets[bucket] == Some(index) {
      self.buckets[bucket] = next;
      return;
    }

    let mut cursor = self.buckets[bucket];
    while let Some(current) = cursor {
      let following = self.nodes[current].next_in_bucket;
      if following == Some(index) {
        self.nodes[current].next_in_bucket = next;
        return;
      }
      cursor = following;
    }
  }

  // Removes `index` from the age list without touching the arena.
  fn unlink_from_age_list(&mut self, index: Index) {
    let (older, newer) = {
      let node = &self.nodes[index];
      (node.older, node.newer)
    };

    match older {
      Some(older_idx) => self.nodes[older_idx].newer = newer,
      None => self.oldest = newer,
    }
    match newer {
      Some(newer_idx) => self.nodes[newer_idx].older = older,
      None => self.newest = older,
    }

    let node = &mut self.nodes[index];
    node.older = None;
    node.newer = None;
  }

  // Threads an unlinked node onto the age list, keeping `inserted_at` sorted.
  // Walks back from the newest end, so a forward-moving clock makes this O(1).
  fn link_by_age(&mut self, index: Index) {
    let inserted_at = self.nodes[index].inserted_at;

    let mut after = self.newest;
    while let Some(candidate) = after {
      if self.nodes[candidate].inserted_at <= inserted_at {
        break;
      }
      after = self.nodes[candidate].older;
    }

    let before = match after {
      Some(after_idx) => self.nodes[after_idx].newer,
      None => self.oldest,
    };

    {
      let node = &mut self.nodes[index];
      node.older = after;
      node.newer = before;
    }

    match after {
      Some(after_idx) => self.nodes[after_idx].newer = Some(index),
      None => self.oldest = Some(index),
    }
    match before {
      Some(before_idx) => self.nodes[before_idx].older = Some(index),
      None => self.newest = Some(index),
    }
  }

  // Doubles the bucket table and rebuilds every chain from cached hashes.
  fn grow(&mut self) {
    let new_len = (self.buckets.len() * 2).min(MAX_BUCKETS);
    if new_len == self.buckets.len() {
      self.grow_at = usize::MAX;
      return;
    }

    let mut buckets: Box<[Option<Index>]> = vec![None; new_len].into_boxed_slice();
    let mask = new_len - 1;
    for (index, node) in self.nodes.iter_mut() {
      let slot = node.hash as usize & mask;
      node.next_in_bucket = buckets[slot];
      buckets[slot] = Some(index);
    }

    self.buckets = buckets;
    self.grow_at = grow_threshold(new_len, self.load_factor);
    tracing::debug!(
      buckets = new_len,
      entries = self.nodes.len(),
      "expiring map grew its bucket table"
    );
  }
}

impl<K, V, H> Store<K, V, H>
where
  H: BuildHasher,
{
  #[inline]
  pub(crate) fn hash<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
    hash_key(&self.hasher, key)
  }
}

/// Walks the age list in either direction.
pub(crate) struct AgeIter<'a, K, V> {
  nodes: &'a Arena<Node<K, V>>,
  front: Option<Index>,
  back: Option<Index>,
  remaining: usize,
}

impl<K, V> Clone for AgeIter<'_, K, V> {
  fn clone(&self) -> Self {
    Self {
      nodes: self.nodes,
      front: self.front,
      back: self.back,
      remaining: self.remaining,
    }
  }
}

impl<'a, K, V> Iterator for AgeIter<'a, K, V> {
  type Item = &'a Node<K, V>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    let nodes = self.nodes;
    let node = &nodes[self.front?];
    self.front = node.newer;
    self.remaining -= 1;
    Some(node)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl<K, V> DoubleEndedIterator for AgeIter<'_, K, V> {
  fn next_back(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    let nodes = self.nodes;
    let node = &nodes[self.back?];
    self.back = node.older;
    self.remaining -= 1;
    Some(node)
  }
}

impl<K, V> ExactSizeIterator for AgeIter<'_, K, V> {}

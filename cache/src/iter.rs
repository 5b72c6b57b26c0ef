//! Contains types for iterating over a map's live contents.

use crate::store::AgeIter;

use std::iter::FusedIterator;
use std::time::Duration;

/// An iterator over the live `(key, value)` pairs of an
/// [`ExpiringMap`](crate::ExpiringMap), oldest write first.
///
/// Liveness is judged once, against the clock reading taken when the
/// iterator was created.
pub struct Iter<'a, K, V> {
  inner: AgeIter<'a, K, V>,
  now: u64,
  ttl: Option<Duration>,
}

impl<'a, K, V> Iter<'a, K, V> {
  pub(crate) fn new(inner: AgeIter<'a, K, V>, now: u64, ttl: Option<Duration>) -> Self {
    Self { inner, now, ttl }
  }
}

impl<K, V> Clone for Iter<'_, K, V> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      now: self.now,
      ttl: self.ttl,
    }
  }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
  type Item = (&'a K, &'a V);

  fn next(&mut self) -> Option<Self::Item> {
    // Expired nodes all sit at the front of the age list.
    loop {
      let node = self.inner.next()?;
      if !node.is_expired(self.now, self.ttl) {
        return Some((&node.key, &node.value));
      }
    }
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, self.inner.size_hint().1)
  }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
  fn next_back(&mut self) -> Option<Self::Item> {
    let node = self.inner.next_back()?;
    if node.is_expired(self.now, self.ttl) {
      // Everything older is expired as well.
      while self.inner.next_back().is_some() {}
      return None;
    }
    Some((&node.key, &node.value))
  }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of live entries.
pub struct Keys<'a, K, V> {
  inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
  pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
    Self { inner }
  }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
  type Item = &'a K;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|(key, _)| key)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}

/// An iterator over the values of live entries.
pub struct Values<'a, K, V> {
  inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
  pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
    Self { inner }
  }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
  type Item = &'a V;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|(_, value)| value)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}

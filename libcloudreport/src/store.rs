use chrono::DateTime;
use chrono::Utc;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct StoredResult<R> {
  /// Modification time of the run the record was parsed from.
  pub observed_at: DateTime<Utc>,
  pub record: R,
}

/// Latest result per key. Iteration is in key order, which makes report rows deterministic.
///
/// The stored timestamp of a key never moves backwards: a result is only replaced by one observed strictly later, and the timestamp is only ever written together with the result it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultStore<R> {
  entries: BTreeMap<String, StoredResult<R>>,
}

impl<R> Default for ResultStore<R> {
  fn default() -> Self {
    Self {
      entries: BTreeMap::new(),
    }
  }
}

impl<R> ResultStore<R> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether a run observed at `candidate` is worth parsing for `key`.
  pub fn should_process(&self, key: &str, candidate: DateTime<Utc>) -> bool {
    match self.entries.get(key) {
      None => true,
      Some(stored) => stored.observed_at < candidate,
    }
  }

  /// Stores `record` if it's fresher than what's stored for `key`. Returns whether it was stored.
  pub fn record(&mut self, key: String, observed_at: DateTime<Utc>, record: R) -> bool {
    if !self.should_process(&key, observed_at) {
      return false;
    };
    self
      .entries
      .insert(key, StoredResult { observed_at, record });
    true
  }

  pub fn get(&self, key: &str) -> Option<&StoredResult<R>> {
    self.entries.get(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredResult<R>)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::ResultStore;
  use chrono::Duration;
  use chrono::TimeZone;
  use chrono::Utc;

  #[test]
  fn test_should_process() {
    let t0 = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
    let mut store = ResultStore::new();
    assert!(store.should_process("m5.large", t0));
    assert!(store.record("m5.large".to_string(), t0, 1));
    assert!(!store.should_process("m5.large", t0));
    assert!(!store.should_process("m5.large", t0 - Duration::seconds(1)));
    assert!(store.should_process("m5.large", t0 + Duration::seconds(1)));
    assert!(store.should_process("m5.xlarge", t0));
  }

  #[test]
  fn test_older_or_equal_never_overwrites() {
    let t0 = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
    let mut store = ResultStore::new();
    store.record("k".to_string(), t0, "a");
    assert!(!store.record("k".to_string(), t0, "b"));
    assert!(!store.record("k".to_string(), t0 - Duration::hours(1), "c"));
    assert_eq!(store.get("k").unwrap().record, "a");
    assert!(store.record("k".to_string(), t0 + Duration::hours(1), "d"));
    let stored = store.get("k").unwrap();
    assert_eq!(stored.record, "d");
    assert_eq!(stored.observed_at, t0 + Duration::hours(1));
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn test_iteration_is_sorted_by_key() {
    let t0 = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
    let mut store = ResultStore::new();
    for k in ["c", "a", "b"] {
      store.record(k.to_string(), t0, ());
    }
    let keys: Vec<&str> = store.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
  }
}

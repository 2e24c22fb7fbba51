//! Keyed co-grouping of independently produced streams.
//!
//! Values arrive as `(key, value)` pairs under a tag naming their source.
//! Each tag may contribute at most one value per key; a second value is a
//! data-integrity defect upstream and is returned as `JoinError::Cardinality`
//! rather than resolved. Groups missing a declared tag are `Incomplete`,
//! which is not an error: callers decide whether that is expected.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    #[error("Join cardinality violated for key {key}: source {tag} contributed {count} values")]
    Cardinality {
        key: String,
        tag: String,
        count: usize,
    },
}

/// All values sharing one key, bucketed by source tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CoGroup<K, T, V> {
    key: K,
    values: BTreeMap<T, Vec<V>>,
}

/// Resolution of a group against a declared tag set.
#[derive(Debug, Clone, PartialEq)]
pub enum Joined<K, T, V> {
    Complete { key: K, values: BTreeMap<T, V> },
    Incomplete { key: K, present: BTreeSet<T> },
}

impl<K, T, V> CoGroup<K, T, V>
where
    K: Display,
    T: Ord + Clone + Display,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn tags(&self) -> BTreeSet<T> {
        self.values.keys().cloned().collect()
    }

    /// The value `tag` contributed, if any.
    pub fn single(&self, tag: &T) -> Result<Option<&V>, JoinError> {
        match self.values.get(tag).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([value]) => Ok(Some(value)),
            Some(values) => Err(self.cardinality_error(tag, values.len())),
        }
    }

    /// Check cardinality for every tag, then completeness against `required`.
    pub fn resolve(self, required: &BTreeSet<T>) -> Result<Joined<K, T, V>, JoinError> {
        if let Some((tag, values)) = self.values.iter().find(|(_, values)| values.len() > 1) {
            return Err(self.cardinality_error(tag, values.len()));
        }

        let present = self.tags();
        if &present != required {
            return Ok(Joined::Incomplete {
                key: self.key,
                present,
            });
        }

        let values = self
            .values
            .into_iter()
            .filter_map(|(tag, mut values)| values.pop().map(|v| (tag, v)))
            .collect();
        Ok(Joined::Complete {
            key: self.key,
            values,
        })
    }

    fn cardinality_error(&self, tag: &T, count: usize) -> JoinError {
        JoinError::Cardinality {
            key: self.key.to_string(),
            tag: tag.to_string(),
            count,
        }
    }
}

/// Group tagged streams by key. Groups are returned in key order.
pub fn co_group<K, T, V, S>(streams: S) -> Vec<CoGroup<K, T, V>>
where
    K: Ord,
    T: Ord + Clone,
    S: IntoIterator<Item = (T, Vec<(K, V)>)>,
{
    let mut groups: BTreeMap<K, BTreeMap<T, Vec<V>>> = BTreeMap::new();
    for (tag, items) in streams {
        for (key, value) in items {
            groups
                .entry(key)
                .or_default()
                .entry(tag.clone())
                .or_default()
                .push(value);
        }
    }
    groups
        .into_iter()
        .map(|(key, values)| CoGroup { key, values })
        .collect()
}

/// Outcome of joining two differently typed sources on one key.
#[derive(Debug, Clone, PartialEq)]
pub enum PairJoin<L, R> {
    Both(L, R),
    LeftOnly(L),
    RightOnly(R),
}

/// Two-source join. Each side may hold at most one value per key.
pub fn join_pair<K, L, R>(
    left_tag: &str,
    left: Vec<(K, L)>,
    right_tag: &str,
    right: Vec<(K, R)>,
) -> Result<Vec<(K, PairJoin<L, R>)>, JoinError>
where
    K: Ord + Display,
{
    let mut lefts = unique_by_key(left_tag, left)?;
    let rights = unique_by_key(right_tag, right)?;

    let mut joined = Vec::with_capacity(lefts.len().max(rights.len()));
    for (key, r) in rights {
        match lefts.remove(&key) {
            Some(l) => joined.push((key, PairJoin::Both(l, r))),
            None => joined.push((key, PairJoin::RightOnly(r))),
        }
    }
    joined.extend(lefts.into_iter().map(|(key, l)| (key, PairJoin::LeftOnly(l))));
    joined.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(joined)
}

fn unique_by_key<K, V>(tag: &str, items: Vec<(K, V)>) -> Result<BTreeMap<K, V>, JoinError>
where
    K: Ord + Display,
{
    let mut grouped: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (key, value) in items {
        grouped.entry(key).or_default().push(value);
    }

    let mut unique = BTreeMap::new();
    for (key, mut values) in grouped {
        if values.len() > 1 {
            return Err(JoinError::Cardinality {
                key: key.to_string(),
                tag: tag.to_string(),
                count: values.len(),
            });
        }
        if let Some(value) = values.pop() {
            unique.insert(key, value);
        }
    }
    Ok(unique)
}

/// Key each non-empty line by its tab-separated `column`.
/// Lines too short to have that column are keyed by the whole line.
pub fn key_lines<I, S>(lines: I, column: usize) -> Vec<(String, String)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                return None;
            }
            let key = line.split('\t').nth(column).unwrap_or(line);
            Some((key.to_string(), line.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(tags: &[&'static str]) -> BTreeSet<&'static str> {
        tags.iter().copied().collect()
    }

    #[test]
    fn complete_group_yields_one_value_per_tag() {
        let groups = co_group(vec![
            ("text", vec![("d1", "T1"), ("d2", "T2")]),
            ("sentences", vec![("d1", "S1")]),
        ]);
        assert_eq!(groups.len(), 2);

        let mut results = groups
            .into_iter()
            .map(|g| g.resolve(&required(&["text", "sentences"])).unwrap());

        match results.next().unwrap() {
            Joined::Complete { key, values } => {
                assert_eq!(key, "d1");
                assert_eq!(values["text"], "T1");
                assert_eq!(values["sentences"], "S1");
            }
            other => panic!("expected complete, got {other:?}"),
        }
        match results.next().unwrap() {
            Joined::Incomplete { key, present } => {
                assert_eq!(key, "d2");
                assert_eq!(present, required(&["text"]));
            }
            other => panic!("expected incomplete, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_tag_value_is_cardinality_error() {
        let groups = co_group(vec![
            ("bert", vec![("s1", "line-a"), ("s1", "line-b")]),
            ("metadata", vec![("s1", "meta")]),
        ]);
        let err = groups
            .into_iter()
            .next()
            .unwrap()
            .resolve(&required(&["bert", "metadata"]))
            .unwrap_err();
        assert_eq!(
            err,
            JoinError::Cardinality {
                key: "s1".into(),
                tag: "bert".into(),
                count: 2
            }
        );
    }

    #[test]
    fn cardinality_checked_before_completeness() {
        let groups = co_group(vec![("bert", vec![("s1", 1), ("s1", 2)])]);
        let result = groups.into_iter().next().unwrap().resolve(&required(&["bert", "metadata"]));
        assert!(matches!(result, Err(JoinError::Cardinality { .. })));
    }

    #[test]
    fn single_reports_duplicates() {
        let groups = co_group(vec![("a", vec![("k", 1), ("k", 2)]), ("b", vec![("k", 3)])]);
        let group = &groups[0];
        assert!(group.single(&"a").is_err());
        assert_eq!(group.single(&"b").unwrap(), Some(&3));
        assert_eq!(group.single(&"c").unwrap(), None);
    }

    #[test]
    fn pair_join_classifies_sides() {
        let joined = join_pair(
            "bert",
            vec![("h", "header"), ("s1", "b1")],
            "metadata",
            vec![("s1", 10), ("s2", 20)],
        )
        .unwrap();
        assert_eq!(
            joined,
            vec![
                ("h", PairJoin::LeftOnly("header")),
                ("s1", PairJoin::Both("b1", 10)),
                ("s2", PairJoin::RightOnly(20)),
            ]
        );
    }

    #[test]
    fn pair_join_rejects_duplicate_keys() {
        let err = join_pair("bert", vec![("s1", 1), ("s1", 2)], "metadata", vec![("s1", 3)]).unwrap_err();
        assert!(matches!(err, JoinError::Cardinality { ref tag, .. } if tag == "bert"));
    }

    #[test]
    fn key_lines_uses_column_and_skips_blank() {
        let keyed = key_lines(["id1\ta\tb", "", "id2\tc\r\n", "lonely"], 0);
        assert_eq!(
            keyed,
            vec![
                ("id1".to_string(), "id1\ta\tb".to_string()),
                ("id2".to_string(), "id2\tc".to_string()),
                ("lonely".to_string(), "lonely".to_string()),
            ]
        );
    }
}

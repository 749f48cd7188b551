use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Logins (or team slugs) grouped by role. A name lives in at most one bucket.
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct RoleBuckets<R: Ord> {
    buckets: BTreeMap<R, BTreeSet<String>>,
}

impl<R: Ord> Default for RoleBuckets<R> {
    fn default() -> Self {
        RoleBuckets {
            buckets: BTreeMap::new(),
        }
    }
}

impl<R: Ord + Copy> RoleBuckets<R> {
    /// Inserts `name` under `role`. Merging the same pair twice is a no-op.
    ///
    /// If `name` was already filed under a different role it is moved, and
    /// the displaced role is returned so the caller can report it.
    pub fn merge(&mut self, name: &str, role: R) -> Option<R> {
        let previous = self.role_of(name).filter(|prev| *prev != role);
        if let Some(prev) = previous {
            if let Some(set) = self.buckets.get_mut(&prev) {
                set.remove(name);
                if set.is_empty() {
                    self.buckets.remove(&prev);
                }
            }
        }
        self.buckets
            .entry(role)
            .or_default()
            .insert(name.to_string());
        previous
    }

    pub fn role_of(&self, name: &str) -> Option<R> {
        self.buckets
            .iter()
            .find(|(_, names)| names.contains(name))
            .map(|(role, _)| *role)
    }

    pub fn contains(&self, role: R, name: &str) -> bool {
        self.buckets
            .get(&role)
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }

    pub fn names(&self, role: R) -> impl Iterator<Item = &str> {
        self.buckets
            .get(&role)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    /// Every `(role, name)` pair, roles in declaration order, names sorted.
    pub fn pairs(&self) -> impl Iterator<Item = (R, &str)> {
        self.buckets
            .iter()
            .flat_map(|(role, names)| names.iter().map(move |name| (*role, name.as_str())))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Ord + Copy> FromIterator<(R, String)> for RoleBuckets<R> {
    fn from_iter<I: IntoIterator<Item = (R, String)>>(iter: I) -> Self {
        let mut buckets = RoleBuckets::default();
        for (role, name) in iter {
            buckets.merge(&name, role);
        }
        buckets
    }
}

/// Documents are folded through `merge`, so a name listed under two roles
/// keeps the later one in role order, like discovery does.
impl<'de, R> Deserialize<'de> for RoleBuckets<R>
where
    R: Deserialize<'de> + Ord + Copy + fmt::Debug,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<R, BTreeSet<String>>::deserialize(deserializer)?;
        let mut buckets = RoleBuckets::default();
        for (role, names) in raw {
            for name in names {
                if let Some(previous) = buckets.merge(&name, role) {
                    warn!(
                        name = %name,
                        dropped = ?previous,
                        kept = ?role,
                        "name listed under two roles"
                    );
                }
            }
        }
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::TeamRole;

    #[test]
    fn merge_is_idempotent() {
        let mut buckets = RoleBuckets::default();
        assert_eq!(buckets.merge("alice", TeamRole::Member), None);
        assert_eq!(buckets.merge("alice", TeamRole::Member), None);
        assert_eq!(buckets.len(), 1);
        assert!(buckets.contains(TeamRole::Member, "alice"));
    }

    #[test]
    fn merge_under_another_role_moves_and_reports() {
        let mut buckets = RoleBuckets::default();
        buckets.merge("alice", TeamRole::Maintainer);
        assert_eq!(
            buckets.merge("alice", TeamRole::Member),
            Some(TeamRole::Maintainer)
        );
        assert_eq!(buckets.role_of("alice"), Some(TeamRole::Member));
        assert_eq!(buckets.names(TeamRole::Maintainer).count(), 0);
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn pairs_are_grouped_by_role() {
        let buckets: RoleBuckets<TeamRole> = [
            (TeamRole::Member, "bob".to_string()),
            (TeamRole::Maintainer, "carol".to_string()),
            (TeamRole::Member, "alice".to_string()),
        ]
        .into_iter()
        .collect();
        let pairs: Vec<_> = buckets.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                (TeamRole::Maintainer, "carol"),
                (TeamRole::Member, "alice"),
                (TeamRole::Member, "bob"),
            ]
        );
    }

    #[test]
    fn deserializing_a_name_under_two_roles_keeps_one() {
        let buckets: RoleBuckets<TeamRole> =
            serde_yaml::from_str("maintainer: [A, B]\nmember: [A]\n").unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.role_of("A"), Some(TeamRole::Member));
        assert!(!buckets.contains(TeamRole::Maintainer, "A"));
        assert!(buckets.contains(TeamRole::Maintainer, "B"));
    }
}

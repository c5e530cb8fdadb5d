//! Group membership set logic

use std::collections::{BTreeMap, BTreeSet};

/// Supporter keys in a group
pub type Members = BTreeSet<u64>;

/// Members of a pair of groups, keyed `(larger, smaller)`. A pair of equal
/// keys holds the group itself.
pub type Overlap = BTreeMap<(u64, u64), Members>;

/// Members of each group of interest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Census {
    groups: BTreeMap<u64, Members>,
}

impl Census {
    /// Census with an empty member set for each of `keys`
    pub fn new(keys: &[u64]) -> Self {
        Self {
            groups: keys.iter().map(|&k| (k, Members::new())).collect(),
        }
    }

    /// Record `supporter` as a member of `group`
    pub fn add(&mut self, group: u64, supporter: u64) {
        self.groups.entry(group).or_default().insert(supporter);
    }

    /// Add a whole member list for `group`
    pub fn extend(&mut self, group: u64, supporters: impl IntoIterator<Item = u64>) {
        self.groups.entry(group).or_default().extend(supporters);
    }

    /// Members of `group`
    pub fn members(&self, group: u64) -> Option<&Members> {
        self.groups.get(&group)
    }

    /// Group keys, ascending
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.groups.keys().copied()
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total memberships across all groups
    pub fn memberships(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    /// Everyone in any group
    pub fn union(&self) -> Members {
        self.groups.values().flatten().copied().collect()
    }
}

/// Members of both sets
pub fn intersect(a: &Members, b: &Members) -> Members {
    a.intersection(b).copied().collect()
}

/// Members of `a` that are not in `b`
pub fn difference(a: &Members, b: &Members) -> Members {
    a.difference(b).copied().collect()
}

/// Pairwise overlap of `included` groups, minus anyone in `excluded`
///
/// Every pair `(i, j)` with `i >= j` is checked, so the diagonal gives each
/// group's own members. Empty results are dropped.
pub fn analyze(included: &Census, excluded: &Census) -> Overlap {
    let excluded = excluded.union();
    let mut overlap = Overlap::new();

    for (&i, m1) in &included.groups {
        for (&j, m2) in included.groups.range(..=i) {
            let members = difference(&intersect(m1, m2), &excluded);
            if !members.is_empty() {
                overlap.insert((i, j), members);
            }
        }
    }
    overlap
}

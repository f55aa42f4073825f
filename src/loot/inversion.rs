//! Weight inversion.
//!
//! Mirrors the ranks of a weighted table: the most common entry receives the
//! smallest weight present in the table and the rarest receives the largest.
//! The multiset of weight values never changes, only which key carries which
//! weight.

use crate::types::{
    AmmoDistribution, ItemCountWeight, ItemDistributionEntry, Location, StaticItemWeight,
};

/// A row in a weighted table.
pub trait Weighted {
    fn weight(&self) -> f64;
    fn set_weight(&mut self, weight: f64);
}

macro_rules! weighted_by_relative_probability {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Weighted for $ty {
                fn weight(&self) -> f64 {
                    self.relative_probability
                }

                fn set_weight(&mut self, weight: f64) {
                    self.relative_probability = weight;
                }
            }
        )*
    };
}

weighted_by_relative_probability!(
    ItemDistributionEntry,
    StaticItemWeight,
    ItemCountWeight,
    AmmoDistribution,
);

impl<K> Weighted for (K, f64) {
    fn weight(&self) -> f64 {
        self.1
    }

    fn set_weight(&mut self, weight: f64) {
        self.1 = weight;
    }
}

/// Invert the weights of `rows` in place, keeping row order.
///
/// Rows are stable-sorted ascending by weight (ties keep their original
/// relative order), weight values are sorted descending, and the i-th
/// descending value is assigned to the i-th ascending row.
pub fn invert_weights<T: Weighted>(rows: &mut [T]) {
    if rows.len() < 2 {
        return;
    }

    let mut ascending: Vec<usize> = (0..rows.len()).collect();
    ascending.sort_by(|&a, &b| rows[a].weight().total_cmp(&rows[b].weight()));

    let mut descending: Vec<f64> = rows.iter().map(Weighted::weight).collect();
    descending.sort_by(|a, b| b.total_cmp(a));

    for (row, weight) in ascending.into_iter().zip(descending) {
        rows[row].set_weight(weight);
    }
}

/// An ordered collection of `(key, weight)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSet<K> {
    entries: Vec<(K, f64)>,
}

impl<K: Clone> WeightedSet<K> {
    pub fn new(entries: Vec<(K, f64)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(K, f64)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(K, f64)> {
        self.entries
    }

    /// A new set with mirrored weight ranks. `self` is untouched.
    pub fn invert(&self) -> Self {
        let mut entries = self.entries.clone();
        invert_weights(&mut entries);
        Self { entries }
    }

    /// Weight values in ascending order, for multiset comparison.
    pub fn sorted_weights(&self) -> Vec<f64> {
        let mut weights: Vec<f64> = self.entries.iter().map(|(_, w)| *w).collect();
        weights.sort_by(f64::total_cmp);
        weights
    }
}

impl<K> FromIterator<(K, f64)> for WeightedSet<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Tables touched by [`invert_location`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InversionCounts {
    pub spawn_points: usize,
    pub containers: usize,
    pub ammo_tables: usize,
}

/// Invert every loot table of a location independently: each loose spawn
/// point's item distribution, each static container's item and item-count
/// distributions, and each static ammo distribution.
pub fn invert_location(location: &mut Location) -> InversionCounts {
    let mut counts = InversionCounts::default();

    if let Some(loose) = location.loose_loot.as_mut() {
        for point in loose.spawnpoints.iter_mut() {
            invert_weights(&mut point.item_distribution);
            counts.spawn_points += 1;
        }
    }

    for container in location.static_loot.values_mut() {
        invert_weights(&mut container.item_distribution);
        invert_weights(&mut container.item_count_distribution);
        counts.containers += 1;
    }

    for ammo in location.static_ammo.values_mut() {
        invert_weights(ammo);
        counts.ammo_tables += 1;
    }

    counts
}

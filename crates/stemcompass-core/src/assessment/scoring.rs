//! Score accumulation over the four STEM categories.

use serde::{Deserialize, Serialize};

use super::category::StemCategory;

/// Points added to a category each time a question is answered for the
/// first time. Both the generated and the bundled question paths use it.
pub const SCORE_INCREMENT: u32 = 10;

/// Per-category counters. Serialized with the category names as keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreMap {
    #[serde(rename = "Science", default)]
    pub science: u32,
    #[serde(rename = "Technology", default)]
    pub technology: u32,
    #[serde(rename = "Engineering", default)]
    pub engineering: u32,
    #[serde(rename = "Mathematics", default)]
    pub mathematics: u32,
}

impl ScoreMap {
    pub fn get(&self, category: StemCategory) -> u32 {
        match category {
            StemCategory::Science => self.science,
            StemCategory::Technology => self.technology,
            StemCategory::Engineering => self.engineering,
            StemCategory::Mathematics => self.mathematics,
        }
    }

    fn slot_mut(&mut self, category: StemCategory) -> &mut u32 {
        match category {
            StemCategory::Science => &mut self.science,
            StemCategory::Technology => &mut self.technology,
            StemCategory::Engineering => &mut self.engineering,
            StemCategory::Mathematics => &mut self.mathematics,
        }
    }

    /// Returns a new map with `increment` added to `category` only.
    #[must_use]
    pub fn with_increment(&self, category: StemCategory, increment: u32) -> ScoreMap {
        let mut next = *self;
        let slot = next.slot_mut(category);
        *slot = slot.saturating_add(increment);
        next
    }

    pub fn total(&self) -> u32 {
        StemCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// Categories by score, highest first. Equal scores keep enumeration
    /// order.
    pub fn ranked(&self) -> Vec<(StemCategory, u32)> {
        let mut ranked: Vec<(StemCategory, u32)> =
            StemCategory::ALL.iter().map(|c| (*c, self.get(*c))).collect();
        // Stable sort preserves the enumeration order among ties.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use StemCategory::*;

    #[test]
    fn increment_touches_only_selected_category() {
        let map = ScoreMap::default().with_increment(Technology, SCORE_INCREMENT);
        assert_eq!(map.technology, 10);
        assert_eq!(map.science + map.engineering + map.mathematics, 0);
    }

    #[test]
    fn serializes_with_category_keys() {
        let map = ScoreMap::default().with_increment(Science, 20);
        let json = serde_json::to_value(map).unwrap();
        assert_eq!(json["Science"], 20);
        assert_eq!(json["Mathematics"], 0);
    }

    #[test]
    fn ranked_breaks_ties_by_enumeration_order() {
        let map = ScoreMap {
            science: 20,
            technology: 10,
            engineering: 0,
            mathematics: 10,
        };
        let ranked = map.ranked();
        assert_eq!(ranked[0], (Science, 20));
        assert_eq!(ranked[1], (Technology, 10));
        assert_eq!(ranked[2], (Mathematics, 10));
        assert_eq!(ranked[3], (Engineering, 0));
    }

    fn category() -> impl Strategy<Value = StemCategory> {
        (0usize..4).prop_map(|i| StemCategory::ALL[i])
    }

    fn accumulate(picks: &[StemCategory], inc: u32) -> ScoreMap {
        picks
            .iter()
            .fold(ScoreMap::default(), |m, c| m.with_increment(*c, inc))
    }

    proptest! {
        #[test]
        fn total_is_count_times_increment(
            picks in prop::collection::vec(category(), 0..40),
            inc in 1u32..20,
        ) {
            let map = accumulate(&picks, inc);
            prop_assert_eq!(map.total(), picks.len() as u32 * inc);
            for cat in StemCategory::ALL {
                if !picks.contains(&cat) {
                    prop_assert_eq!(map.get(cat), 0);
                }
            }
        }

        #[test]
        fn accumulation_is_order_independent(
            mut picks in prop::collection::vec(category(), 0..40)
        ) {
            let forward = accumulate(&picks, SCORE_INCREMENT);
            picks.reverse();
            let backward = accumulate(&picks, SCORE_INCREMENT);
            prop_assert_eq!(forward, backward);
        }
    }
}

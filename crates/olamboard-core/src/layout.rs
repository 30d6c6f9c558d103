//! Default arrangement of element cards when no save code is loaded.

use crate::cards::{CardId, CardStore};
use crate::catalog::DefaultSort;
use crate::grid::CellKey;
use std::cmp::Ordering;

/// Small deterministic generator (splitmix64) so layouts can be reproduced
/// from a seed on every platform.
#[derive(Debug, Clone)]
pub struct LayoutRng {
    state: u64,
}

impl LayoutRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from a fresh random UUID.
    pub fn from_entropy() -> Self {
        Self::new(uuid::Uuid::new_v4().as_u64_pair().0)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Shuffle in place. Each slot swaps with a strictly earlier one.
pub fn shuffle<T>(items: &mut [T], rng: &mut LayoutRng) {
    for i in (1..items.len()).rev() {
        let index = (rng.next_f64() * i as f64).floor() as usize;
        items.swap(i, index.min(i - 1));
    }
}

fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Cells for every element the catalog does not mark hidden. Showing
/// hidden elements makes them visible but leaves them unplaced.
///
/// A random sort fills a square `ceil(sqrt(n))` cells wide. Any other sort
/// lays the cards out in row 0, ordered by the numeric property (cards
/// without it go last, in catalog order).
pub fn default_layout(
    cards: &CardStore,
    sort: &DefaultSort,
    rng: &mut LayoutRng,
) -> Vec<(CardId, CellKey)> {
    let mut visible: Vec<CardId> = cards
        .elements()
        .filter(|card| !card.record().is_some_and(|record| record.hidden))
        .map(|card| card.id)
        .collect();

    match sort {
        DefaultSort::Random => {
            let width = (visible.len() as f64).sqrt().ceil().max(1.0) as usize;
            shuffle(&mut visible, rng);
            visible
                .into_iter()
                .enumerate()
                .map(|(i, id)| (id, CellKey::new((i % width) as i64, (i / width) as i64)))
                .collect()
        }
        DefaultSort::Property(key) => {
            let value = |id: &CardId| {
                cards
                    .get(*id)
                    .and_then(|card| card.record())
                    .and_then(|record| record.numeric_property(key))
            };
            visible.sort_by(|a, b| compare_keys(value(a), value(b)));
            in_a_row(visible)
        }
        DefaultSort::Unsorted => in_a_row(visible),
    }
}

fn in_a_row(ids: Vec<CardId>) -> Vec<(CardId, CellKey)> {
    ids.into_iter()
        .enumerate()
        .map(|(i, id)| (id, CellKey::new(i as i64, 0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ElementRecord;
    use std::collections::HashSet;

    fn store(numbers: &[(&str, Option<i64>, bool)]) -> CardStore {
        let mut cards = CardStore::new();
        for (symbol, number, hidden) in numbers {
            let mut record = ElementRecord::new(*symbol, *symbol);
            if let Some(n) = number {
                record = record.with_property("number", *n);
            }
            record.hidden = *hidden;
            cards.add_element(record);
        }
        cards
    }

    fn symbols(cards: &CardStore, layout: &[(CardId, CellKey)]) -> Vec<String> {
        layout
            .iter()
            .map(|(id, _)| cards.get(*id).unwrap().identifier())
            .collect()
    }

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = LayoutRng::new(42);
        let mut b = LayoutRng::new(42);
        for _ in 0..10 {
            let x = a.next_f64();
            assert!((0.0..1.0).contains(&x));
            assert_eq!(x.to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..20).collect();
        shuffle(&mut items, &mut LayoutRng::new(7));
        let unique: HashSet<u32> = items.iter().copied().collect();
        assert_eq!(unique.len(), 20);
        assert_ne!(items, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_sorted_layout_in_one_row() {
        let cards = store(&[("C", Some(6), false), ("H", Some(1), false), ("X", None, false), ("He", Some(2), false)]);
        let layout = default_layout(&cards, &DefaultSort::Property("number".into()), &mut LayoutRng::new(1));
        assert_eq!(symbols(&cards, &layout), vec!["H", "He", "C", "X"]);
        let cells: Vec<CellKey> = layout.iter().map(|(_, cell)| *cell).collect();
        assert_eq!(cells, (0..4).map(|i| CellKey::new(i, 0)).collect::<Vec<_>>());
    }

    #[test]
    fn test_hidden_cards_are_not_placed() {
        let cards = store(&[("H", Some(1), false), ("Xx", Some(0), true)]);
        let layout = default_layout(&cards, &DefaultSort::Unsorted, &mut LayoutRng::new(1));
        assert_eq!(symbols(&cards, &layout), vec!["H"]);
    }

    #[test]
    fn test_shown_hidden_cards_stay_unplaced() {
        let mut cards = store(&[("H", Some(1), false), ("Xx", Some(0), true)]);
        let xx = cards.element_ids()[1];
        cards.get_mut(xx).unwrap().hidden = false;
        let layout = default_layout(&cards, &DefaultSort::Property("number".into()), &mut LayoutRng::new(1));
        assert_eq!(symbols(&cards, &layout), vec!["H"]);
    }

    #[test]
    fn test_random_layout_fills_a_square() {
        let names: Vec<String> = (0..10).map(|i| format!("E{i}")).collect();
        let spec: Vec<(&str, Option<i64>, bool)> = names.iter().map(|n| (n.as_str(), None, false)).collect();
        let cards = store(&spec);
        let layout = default_layout(&cards, &DefaultSort::Random, &mut LayoutRng::new(3));
        assert_eq!(layout.len(), 10);
        let cells: HashSet<CellKey> = layout.iter().map(|(_, cell)| *cell).collect();
        assert_eq!(cells.len(), 10);
        assert!(cells.iter().all(|c| (0..4).contains(&c.x) && (0..3).contains(&c.y)));
    }
}

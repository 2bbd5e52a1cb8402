use std::collections::BTreeMap;

/// Class ids and won values shared by the general and coin detectors.
const KOREAN_WON: [(u32, u32); 8] = [
    (0, 10),
    (1, 50),
    (2, 100),
    (3, 500),
    (4, 1_000),
    (5, 5_000),
    (6, 10_000),
    (7, 50_000),
];

/// Maps a model's class ids to monetary amounts.
///
/// Fixed by the label space the model was trained with. Unknown ids, and ids
/// explicitly mapped to 0, resolve to amount 0 and are treated as "not money".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenominationTable {
    amounts: BTreeMap<u32, u32>,
}

impl DenominationTable {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        Self {
            amounts: pairs.into_iter().collect(),
        }
    }

    /// Coins (10, 50, 100, 500) and notes (1000 to 50000) as classes 0 to 7.
    pub fn korean_won() -> Self {
        Self::from_pairs(KOREAN_WON)
    }

    pub fn amount(&self, class_id: u32) -> u32 {
        self.amounts.get(&class_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.amounts.iter().map(|(&class_id, &amount)| (class_id, amount))
    }
}

impl Default for DenominationTable {
    fn default() -> Self {
        Self::korean_won()
    }
}

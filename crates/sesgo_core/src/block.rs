//! Round/block configuration.
//!
//! Each IAT round pins category names to the two response sides. Combined
//! rounds carry both a primary (target) and a secondary (attribute)
//! category per side; sorting rounds carry only one class.

use crate::trial::{Side, StimulusClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categories assigned to one side of the screen for a round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePairing {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl SidePairing {
    pub fn primary(name: impl Into<String>) -> Self {
        Self {
            primary: Some(name.into()),
            secondary: None,
        }
    }

    pub fn secondary(name: impl Into<String>) -> Self {
        Self {
            primary: None,
            secondary: Some(name.into()),
        }
    }

    pub fn combined(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: Some(primary.into()),
            secondary: Some(secondary.into()),
        }
    }
}

/// One round's category layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSetup {
    #[serde(default)]
    pub practice: bool,
    pub left: SidePairing,
    pub right: SidePairing,
}

impl BlockSetup {
    fn side(&self, side: Side) -> &SidePairing {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn category(&self, side: Side, class: StimulusClass) -> Option<&str> {
        let pairing = self.side(side);
        match class {
            StimulusClass::Primary => pairing.primary.as_deref(),
            StimulusClass::Secondary => pairing.secondary.as_deref(),
        }
    }

    /// Classes actually defined for a side in this round.
    pub fn classes_for(&self, side: Side) -> Vec<StimulusClass> {
        let pairing = self.side(side);
        let mut classes = Vec::new();
        if pairing.primary.is_some() {
            classes.push(StimulusClass::Primary);
        }
        if pairing.secondary.is_some() {
            classes.push(StimulusClass::Secondary);
        }
        classes
    }

    /// Display labels per side and class, with any "prefix:" stripped.
    /// Page-facing surface: rendered as the on-screen key legend; the
    /// engine itself only ever reads raw category names.
    pub fn labels(&self) -> BTreeMap<(Side, StimulusClass), String> {
        let mut labels = BTreeMap::new();
        for side in [Side::Left, Side::Right] {
            for class in [StimulusClass::Primary, StimulusClass::Secondary] {
                if let Some(cat) = self.category(side, class) {
                    labels.insert((side, class), strip_prefix(cat));
                }
            }
        }
        labels
    }
}

fn strip_prefix(category: &str) -> String {
    match category.split_once(':') {
        Some((_, label)) => label.to_string(),
        None => category.to_string(),
    }
}

/// The full round → block mapping for one participant's session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSchedule {
    rounds: BTreeMap<u32, BlockSetup>,
}

impl BlockSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, round: u32, setup: BlockSetup) {
        self.rounds.insert(round, setup);
    }

    /// Rounds without a setup (e.g. pure decision rounds) get an empty one.
    pub fn get(&self, round: u32) -> BlockSetup {
        self.rounds.get(&round).cloned().unwrap_or_default()
    }

    pub fn contains(&self, round: u32) -> bool {
        self.rounds.contains_key(&round)
    }

    /// The canonical seven-block IAT layout for one administration,
    /// occupying rounds `base..base+7`.
    ///
    /// `primary` and `secondary` are (left, right) category pairs for the
    /// compatible arrangement; blocks 5-7 reverse the primary pair.
    pub fn push_seven_block(
        &mut self,
        base: u32,
        primary: (&str, &str),
        secondary: (&str, &str),
    ) {
        let (pl, pr) = primary;
        let (sl, sr) = secondary;
        // 1: primary sorting, 2: attribute sorting
        self.insert(
            base,
            BlockSetup {
                practice: true,
                left: SidePairing::primary(pl),
                right: SidePairing::primary(pr),
            },
        );
        self.insert(
            base + 1,
            BlockSetup {
                practice: true,
                left: SidePairing::secondary(sl),
                right: SidePairing::secondary(sr),
            },
        );
        // 3-4: combined, compatible arrangement
        for offset in [2, 3] {
            self.insert(
                base + offset,
                BlockSetup {
                    practice: offset == 2,
                    left: SidePairing::combined(pl, sl),
                    right: SidePairing::combined(pr, sr),
                },
            );
        }
        // 5: reversed primary sorting
        self.insert(
            base + 4,
            BlockSetup {
                practice: true,
                left: SidePairing::primary(pr),
                right: SidePairing::primary(pl),
            },
        );
        // 6-7: combined, incompatible arrangement
        for offset in [5, 6] {
            self.insert(
                base + offset,
                BlockSetup {
                    practice: offset == 5,
                    left: SidePairing::combined(pr, sl),
                    right: SidePairing::combined(pl, sr),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> BlockSchedule {
        let mut s = BlockSchedule::new();
        s.push_seven_block(1, ("thin", "heavy"), ("good", "bad"));
        s
    }

    #[test]
    fn test_sorting_round_has_single_class() {
        let block = schedule().get(1);
        assert_eq!(block.classes_for(Side::Left), vec![StimulusClass::Primary]);
        assert_eq!(
            block.category(Side::Left, StimulusClass::Primary),
            Some("thin")
        );
        assert!(block.category(Side::Left, StimulusClass::Secondary).is_none());
    }

    #[test]
    fn test_combined_round_has_both_classes() {
        let block = schedule().get(4);
        assert_eq!(block.classes_for(Side::Right).len(), 2);
        assert!(!block.practice);
    }

    #[test]
    fn test_reversed_blocks_swap_primary_only() {
        let s = schedule();
        let compatible = s.get(3);
        let incompatible = s.get(6);
        assert_eq!(
            compatible.category(Side::Left, StimulusClass::Primary),
            Some("thin")
        );
        assert_eq!(
            incompatible.category(Side::Left, StimulusClass::Primary),
            Some("heavy")
        );
        // attributes stay put
        assert_eq!(
            incompatible.category(Side::Left, StimulusClass::Secondary),
            Some("good")
        );
    }

    #[test]
    fn test_missing_round_is_empty() {
        let block = schedule().get(99);
        assert!(block.classes_for(Side::Left).is_empty());
    }

    #[test]
    fn test_label_prefix_stripped() {
        let block = BlockSetup {
            practice: false,
            left: SidePairing::primary("people:thin people"),
            right: SidePairing::primary("heavy people"),
        };
        let labels = block.labels();
        assert_eq!(
            labels[&(Side::Left, StimulusClass::Primary)],
            "thin people"
        );
        assert_eq!(
            labels[&(Side::Right, StimulusClass::Primary)],
            "heavy people"
        );
    }
}

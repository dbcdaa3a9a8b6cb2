//! Property-based tests for the disclosure mechanism.

use proptest::prelude::*;
use sesgo_core::participant::PreferenceDeclaration;
use sesgo_disclosure::{
    decision_draw, reveal_threshold, DecisionKey, OutcomeStore, REVEAL_LIKELY, REVEAL_UNLIKELY,
};

fn arb_declaration() -> impl Strategy<Value = Option<PreferenceDeclaration>> {
    proptest::option::of(
        (
            -2.0f64..1.9,
            0.01f64..1.0,
            proptest::option::of(any::<bool>()),
            proptest::option::of(any::<bool>()),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(lower, width, below, inside, above)| {
                PreferenceDeclaration::new(lower, lower + width)
                    .unwrap()
                    .with_flags(below, inside, above)
            }),
    )
}

proptest! {
    /// The threshold is total and always exactly 0.80 or 0.20, whatever
    /// the declaration and score look like.
    #[test]
    fn threshold_is_total_and_two_valued(
        declaration in arb_declaration(),
        score in proptest::option::of(-3.0f64..3.0),
    ) {
        let t = reveal_threshold(declaration.as_ref(), score);
        prop_assert!(t == REVEAL_LIKELY || t == REVEAL_UNLIKELY);
    }

    /// An absent score always defaults to reveal, regardless of flags.
    #[test]
    fn absent_score_defaults_to_reveal(declaration in arb_declaration()) {
        prop_assert_eq!(reveal_threshold(declaration.as_ref(), None), REVEAL_LIKELY);
    }

    /// The same decision key always produces the same draw.
    #[test]
    fn draw_is_deterministic(code in "[a-z0-9]{1,12}", round in 1u32..20, position in 0u32..8) {
        let key = DecisionKey::new(code, round, position);
        prop_assert_eq!(decision_draw(&key), decision_draw(&key));
    }

    /// Deciding twice yields the identical persisted outcome, even when
    /// the inputs differ on replay.
    #[test]
    fn outcome_is_frozen_after_first_decision(
        declaration in arb_declaration(),
        score in proptest::option::of(-3.0f64..3.0),
        code in "[a-z0-9]{1,12}",
    ) {
        let mut store = OutcomeStore::new();
        let key = DecisionKey::new(code, 15, 0);
        let first = store.decide(key.clone(), declaration.as_ref(), score, "group a").clone();
        let replay = store.decide(key, None, None, "group b").clone();
        prop_assert_eq!(first, replay);
    }
}

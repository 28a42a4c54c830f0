//! Property-based tests for the expression engine.
//!
//! These tests use proptest to verify invariants around:
//! - Canonical rendering re-parsing to the same tree
//! - Simplification being idempotent and meaning-preserving
//! - Equivalence and decomposition ignoring operand order

use license_expr::{parse, Expression};
use proptest::prelude::*;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Leaf expressions drawn from the built-in catalog.
fn arb_leaf() -> impl Strategy<Value = Expression> {
    prop_oneof![
        Just("MIT"),
        Just("Apache-2.0"),
        Just("Apache-2.0+"),
        Just("BSD-3-Clause"),
        Just("GPL-2.0-only"),
        Just("GPL-2.0-or-later WITH Classpath-exception-2.0"),
        Just("Apache-2.0 WITH LLVM-exception"),
        Just("LicenseRef-internal"),
    ]
    .prop_map(|text| parse(text, true).unwrap())
}

/// Arbitrary trees of `AND` / `OR` nodes over [`arb_leaf`].
fn arb_expression() -> impl Strategy<Value = Expression> {
    arb_leaf().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|ops| Expression::and(ops).unwrap()),
            prop::collection::vec(inner, 2..4).prop_map(|ops| Expression::or(ops).unwrap()),
        ]
    })
}

/// Reverse every operand list, recursively.
fn reversed(expr: &Expression) -> Expression {
    match expr {
        Expression::License(_) | Expression::With(_) => expr.clone(),
        Expression::And(_) => {
            Expression::and(expr.operands().iter().rev().map(reversed)).unwrap()
        }
        Expression::Or(_) => Expression::or(expr.operands().iter().rev().map(reversed)).unwrap(),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn canonical_string_reparses_to_same_tree(expr in arb_expression()) {
        let text = expr.to_canonical_string();
        let reparsed = parse(&text, true).unwrap();
        prop_assert_eq!(reparsed, expr);
    }

    #[test]
    fn simplify_is_idempotent(expr in arb_expression()) {
        let once = expr.simplify();
        prop_assert_eq!(once.simplify(), once);
    }

    #[test]
    fn simplify_preserves_equivalence_and_choices(expr in arb_expression()) {
        let simplified = expr.simplify();
        prop_assert!(simplified.equivalent(&expr));
        // Dropping a repeated AND operand can only remove redundant choices.
        let original = expr.decompose();
        for choice in simplified.decompose() {
            prop_assert!(original.contains(&choice));
        }
    }

    #[test]
    fn operand_order_is_irrelevant(expr in arb_expression()) {
        let flipped = reversed(&expr);
        prop_assert!(expr.equivalent(&flipped));
        prop_assert!(flipped.equivalent(&expr));
        prop_assert_eq!(expr.decompose(), flipped.decompose());
    }

    #[test]
    fn decompose_is_sorted_and_unique(expr in arb_expression()) {
        let choices = expr.decompose();
        prop_assert!(!choices.is_empty());
        prop_assert!(choices.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn every_choice_uses_only_leaf_licenses(expr in arb_expression()) {
        let licenses = expr.licenses();
        for choice in expr.decompose() {
            prop_assert!(!choice.is_empty());
            for term in &choice {
                prop_assert!(licenses.contains(&term.license));
            }
        }
    }
}

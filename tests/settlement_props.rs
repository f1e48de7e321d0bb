use banca_terminal::settlement::{Settlement, parse_settlement, profit, profit_for_label};

#[test]
fn profit_identities_hold_across_inputs() {
    let stakes = [1.0, 10.0, 33.5, 250.0];
    let odds = [1.01, 1.5, 1.8, 2.77, 10.0];
    for &s in &stakes {
        for &o in &odds {
            let green = profit(Settlement::Green, o, s);
            assert!((green - (s * o - s)).abs() < 1e-9);
            assert!((profit(Settlement::HalfGreen, o, s) - green / 2.0).abs() < 1e-9);
            assert_eq!(profit(Settlement::Red, o, s), -s);
            assert!((profit(Settlement::HalfRed, o, s) - (-s / 2.0)).abs() < 1e-9);
            assert_eq!(profit(Settlement::Void, o, s), 0.0);
            assert_eq!(profit(Settlement::Pending, o, s), 0.0);
        }
    }
}

#[test]
fn worked_examples() {
    assert!((profit_for_label("Green", 1.80, 10.0) - 8.0).abs() < 1e-9);
    assert!((profit_for_label("Meio Red", 1.80, 10.0) - (-5.0)).abs() < 1e-9);
    assert_eq!(profit_for_label("Devolvida", 1.80, 10.0), 0.0);
}

#[test]
fn label_formatting_is_irrelevant_semantics_are_not() {
    let variants = ["green", " GREEN ", "Green", "gReEn", "green\t"];
    for v in variants {
        assert_eq!(parse_settlement(v), Some(Settlement::Green));
        assert!((profit_for_label(v, 2.0, 10.0) - 10.0).abs() < 1e-9);
    }

    // Same characters, different meaning.
    assert_eq!(parse_settlement("Meio Green"), Some(Settlement::HalfGreen));
    assert!(
        profit_for_label("Meio Green", 2.0, 10.0) < profit_for_label("Green", 2.0, 10.0)
    );
}

#[test]
fn recomputation_is_idempotent() {
    for s in Settlement::ALL {
        let first = profit(s, 1.91, 42.0);
        let second = profit(s, 1.91, 42.0);
        assert_eq!(first, second);
    }
}

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Final state of a bet as graded by the user.
///
/// Labels in the wild are messy: the data entered through older variants of
/// this tracker mixes English and Portuguese ("Meio Red", "Devolvida"), odd
/// casing and stray whitespace. Parsing is therefore alias-driven and
/// normalizing; storage always uses the canonical English label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Settlement {
    Pending,
    Green,
    HalfGreen,
    Red,
    HalfRed,
    Void,
}

impl Settlement {
    pub const ALL: [Settlement; 6] = [
        Settlement::Pending,
        Settlement::Green,
        Settlement::HalfGreen,
        Settlement::Red,
        Settlement::HalfRed,
        Settlement::Void,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Settlement::Pending => "Pending",
            Settlement::Green => "Green",
            Settlement::HalfGreen => "Half Green",
            Settlement::Red => "Red",
            Settlement::HalfRed => "Half Red",
            Settlement::Void => "Void",
        }
    }

    pub fn is_settled(self) -> bool {
        !matches!(self, Settlement::Pending)
    }

    /// Next option in the grading cycle (History screen uses this).
    pub fn cycled(self) -> Settlement {
        let idx = Settlement::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or(0);
        Settlement::ALL[(idx + 1) % Settlement::ALL.len()]
    }
}

static ALIASES: Lazy<HashMap<&'static str, Settlement>> = Lazy::new(|| {
    HashMap::from([
        ("pending", Settlement::Pending),
        ("pendente", Settlement::Pending),
        ("green", Settlement::Green),
        ("win", Settlement::Green),
        ("ganha", Settlement::Green),
        ("half green", Settlement::HalfGreen),
        ("meio green", Settlement::HalfGreen),
        ("red", Settlement::Red),
        ("loss", Settlement::Red),
        ("perdida", Settlement::Red),
        ("half red", Settlement::HalfRed),
        ("meio red", Settlement::HalfRed),
        ("void", Settlement::Void),
        ("annulled", Settlement::Void),
        ("anulada", Settlement::Void),
        ("devolvida", Settlement::Void),
        ("reembolso", Settlement::Void),
        ("push", Settlement::Void),
    ])
});

/// Parse a settlement label. Case and whitespace are irrelevant; unknown
/// strings yield `None` so callers can warn instead of silently zeroing.
pub fn parse_settlement(raw: &str) -> Option<Settlement> {
    let normalized = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    ALIASES.get(normalized.as_str()).copied()
}

/// Signed profit for one bet. Pure in (settlement, odds, stake): the same
/// inputs always yield the same result, so recomputation is idempotent.
pub fn profit(settlement: Settlement, odds: f64, stake: f64) -> f64 {
    match settlement {
        Settlement::Green => stake * odds - stake,
        Settlement::HalfGreen => (stake * odds - stake) / 2.0,
        Settlement::Red => -stake,
        Settlement::HalfRed => -stake / 2.0,
        Settlement::Void | Settlement::Pending => 0.0,
    }
}

/// Profit from a raw label. Unrecognized labels score like Pending (zero);
/// edit paths are expected to surface the rejected label separately.
pub fn profit_for_label(raw: &str, odds: f64, stake: f64) -> f64 {
    match parse_settlement(raw) {
        Some(settlement) => profit(settlement, odds, stake),
        None => 0.0,
    }
}

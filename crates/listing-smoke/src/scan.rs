//! Listing card detection
//!
//! Scanning is split in two halves:
//!
//! 1. [`snapshot_cards`] talks to the browser. It enumerates every element
//!    matching the card selector in document order and records its rendered
//!    text and how many favorite controls it contains.
//! 2. [`evaluate`] is pure. A card qualifies when its text contains the price
//!    marker and it holds at least one control.
//!
//! # Example
//!
//! ```
//! use listing_smoke::scan::{evaluate, CardSnapshot, Expectation};
//!
//! let cards = vec![
//!     CardSnapshot { index: 0, text: "Categorias".into(), control_count: 0 },
//!     CardSnapshot { index: 1, text: "Bicicleta R$ 450".into(), control_count: 1 },
//! ];
//! let outcome = evaluate(&cards, &Expectation::new("R$", 1));
//! assert!(outcome.passed);
//! assert_eq!(outcome.qualifying, vec![1]);
//! ```

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// What was observed for one element matching the card selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSnapshot {
    /// Position among all matches, in document order
    pub index: usize,
    /// Rendered inner text (empty when the element has none)
    pub text: String,
    /// Number of descendants matching the control selector
    pub control_count: usize,
}

impl CardSnapshot {
    pub fn has_price(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }

    pub fn has_control(&self) -> bool {
        self.control_count > 0
    }
}

/// Criteria a page has to meet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Case-sensitive substring identifying a price
    pub price_marker: String,
    /// Minimum number of qualifying cards
    pub min_cards: u32,
}

impl Expectation {
    pub fn new(price_marker: impl Into<String>, min_cards: u32) -> Self {
        Self {
            price_marker: price_marker.into(),
            min_cards,
        }
    }
}

/// Result of evaluating a page's cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Elements matching the card selector
    pub scanned: usize,
    /// Elements whose text contained the price marker
    pub priced: usize,
    /// Indices of cards showing both a price and a control
    pub qualifying: Vec<usize>,
    /// Minimum qualifying cards required
    pub min_cards: u32,
    /// Whether enough qualifying cards were found
    pub passed: bool,
}

impl ScanOutcome {
    pub fn qualifying_count(&self) -> usize {
        self.qualifying.len()
    }
}

/// Decide which cards qualify
pub fn evaluate(cards: &[CardSnapshot], expectation: &Expectation) -> ScanOutcome {
    let mut priced = 0;
    let mut qualifying = Vec::new();

    for card in cards {
        if !card.has_price(&expectation.price_marker) {
            continue;
        }
        priced += 1;
        if card.has_control() {
            qualifying.push(card.index);
        }
    }

    let passed = qualifying.len() >= expectation.min_cards as usize;
    ScanOutcome {
        scanned: cards.len(),
        priced,
        qualifying,
        min_cards: expectation.min_cards,
        passed,
    }
}

/// Snapshot every element matching `card_selector` on the current page
///
/// # Errors
///
/// Returns an error if the selector is rejected by the browser or an element
/// is detached while it is being inspected.
#[instrument(skip(page))]
pub async fn snapshot_cards(
    page: &Page,
    card_selector: &str,
    control_selector: &str,
) -> Result<Vec<CardSnapshot>> {
    let elements = page
        .find_elements(card_selector)
        .await
        .with_context(|| format!("Failed to query card selector: {}", card_selector))?;

    let mut snapshots = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let text = element
            .inner_text()
            .await
            .with_context(|| format!("Failed to read text of card {}", index))?
            .unwrap_or_default();

        let control_count = element
            .find_elements(control_selector)
            .await
            .with_context(|| format!("Failed to query controls of card {}", index))?
            .len();

        snapshots.push(CardSnapshot {
            index,
            text,
            control_count,
        });
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn card(index: usize, text: &str, control_count: usize) -> CardSnapshot {
        CardSnapshot {
            index,
            text: text.to_string(),
            control_count,
        }
    }

    #[test]
    fn test_no_cards_fails() {
        let outcome = evaluate(&[], &Expectation::new("R$", 1));

        assert_eq!(outcome.scanned, 0);
        assert_eq!(outcome.priced, 0);
        assert!(outcome.qualifying.is_empty());
        assert!(!outcome.passed);
    }

    #[test]
    fn test_price_and_control_required() {
        let cards = vec![
            card(0, "Ver todas as categorias", 1),
            card(1, "Sofá retrátil\nR$ 1.200\nSão Paulo", 0),
            card(2, "iPhone 13\nR$ 3.500\nCuritiba", 1),
            card(3, "Destaque", 0),
            card(4, "Mesa de jantar R$ 800", 2),
        ];

        let outcome = evaluate(&cards, &Expectation::new("R$", 1));

        assert_eq!(outcome.scanned, 5);
        assert_eq!(outcome.priced, 3);
        assert_eq!(outcome.qualifying, vec![2, 4]);
        assert_eq!(outcome.qualifying_count(), 2);
        assert!(outcome.passed);
    }

    #[test]
    fn test_priced_cards_without_controls_fail() {
        let cards = vec![card(0, "R$ 10", 0), card(1, "R$ 20", 0)];
        let outcome = evaluate(&cards, &Expectation::new("R$", 1));

        assert_eq!(outcome.priced, 2);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let cards = vec![card(0, "r$ 10", 1)];
        assert!(!evaluate(&cards, &Expectation::new("R$", 1)).passed);
    }

    #[test]
    fn test_min_cards_threshold() {
        let cards = vec![card(0, "R$ 10", 1), card(1, "R$ 20", 1)];

        assert!(evaluate(&cards, &Expectation::new("R$", 2)).passed);
        let outcome = evaluate(&cards, &Expectation::new("R$", 3));
        assert!(!outcome.passed);
        assert_eq!(outcome.min_cards, 3);
    }

    #[test]
    fn test_evaluate_does_not_log() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        let cards = vec![card(0, "R$ 10", 1), card(1, "Destaque", 0)];
        let outcome = tracing::subscriber::with_default(subscriber, || {
            evaluate(&cards, &Expectation::new("R$", 1))
        });

        assert!(outcome.passed);
        assert!(
            captured.0.lock().unwrap().is_empty(),
            "evaluate emitted log output"
        );
    }

    fn arb_card() -> impl Strategy<Value = (String, usize)> {
        (
            prop_oneof![
                Just("R$ 99".to_string()),
                Just("Grátis".to_string()),
                "[a-z ]{0,12}",
            ],
            0usize..3,
        )
    }

    proptest! {
        #[test]
        fn prop_qualifying_matches_predicate(
            raw in prop::collection::vec(arb_card(), 0..20),
            min_cards in 1u32..5,
        ) {
            let cards: Vec<CardSnapshot> = raw
                .iter()
                .enumerate()
                .map(|(i, (text, controls))| card(i, text, *controls))
                .collect();

            let outcome = evaluate(&cards, &Expectation::new("R$", min_cards));

            let expected: Vec<usize> = cards
                .iter()
                .filter(|c| c.text.contains("R$") && c.control_count > 0)
                .map(|c| c.index)
                .collect();
            prop_assert_eq!(&outcome.qualifying, &expected);
            prop_assert!(outcome.priced >= outcome.qualifying.len());
            prop_assert!(outcome.scanned >= outcome.priced);
            prop_assert_eq!(outcome.passed, expected.len() >= min_cards as usize);
        }
    }
}

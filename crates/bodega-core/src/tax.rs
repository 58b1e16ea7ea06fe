//! # Cost & Tax Resolver
//!
//! Pure decomposition of tax-inclusive prices into net/tax components, and
//! proportional apportionment of total tax across multiple percentage taxes.
//!
//! ## The Decomposition Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Point-of-sale prices are displayed tax-inclusive:                      │
//! │                                                                         │
//! │    Shelf price: $119.00  (19% IVA already inside)                       │
//! │                                                                         │
//! │  The accounting rows need the decomposition:                            │
//! │                                                                         │
//! │    net   = 119.00 / (1 + 19/100) = 100.00                               │
//! │    tax   = 119.00 - 100.00       =  19.00                               │
//! │                                                                         │
//! │  With several percentage taxes, the total tax is apportioned by rate:   │
//! │                                                                         │
//! │    amount(t) = total_tax × rate(t) / Σ rates                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fixed-amount taxes (`is_fixed`) and taxes with non-positive rates are
//! excluded from this computation entirely.

use serde::Deserialize;

use crate::money::Money;
use crate::types::{StockDirection, Tax, TaxRate};

// =============================================================================
// Pricing Policy
// =============================================================================

/// Shape of the liquidation side-channel JSON stored on `internal_note`.
///
/// The external pricing tool writes a larger structure; the core reads one
/// boolean and ignores the rest.
#[derive(Debug, Deserialize)]
struct LiquidationNote {
    #[serde(rename = "ivaIncludedInCost")]
    iva_included_in_cost: Option<bool>,
}

/// Resolves whether a document's entered prices include tax.
///
/// ## Policy
/// - OUT documents: always true (POS prices are displayed tax-inclusive)
/// - IN documents: `ivaIncludedInCost` from the liquidation note, defaulting
///   to true when the note is absent or unparseable
/// - NONE documents: same default path as IN (the choice only affects the
///   draft's tax rows)
pub fn prices_include_tax(direction: StockDirection, internal_note: Option<&str>) -> bool {
    if direction == StockDirection::Out {
        return true;
    }

    internal_note
        .and_then(|raw| serde_json::from_str::<LiquidationNote>(raw).ok())
        .and_then(|note| note.iva_included_in_cost)
        .unwrap_or(true)
}

// =============================================================================
// Decomposition
// =============================================================================

/// One apportioned tax amount for a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxLine {
    pub tax_id: String,
    pub rate: TaxRate,
    pub amount: Money,
}

/// Result of decomposing a line's gross amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxDecomposition {
    /// Net-of-tax amount.
    pub net: Money,
    /// One line per applicable percentage tax, in input order.
    pub lines: Vec<TaxLine>,
}

impl TaxDecomposition {
    /// Total apportioned tax across all lines.
    pub fn total_tax(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.amount)
    }
}

/// Decomposes a line's gross-after-discount amount against its applicable
/// percentage taxes.
///
/// ## Rules
/// - Taxes that are fixed-amount, disabled, or have a non-positive rate are
///   skipped; if none remain, `net = gross` and no lines are produced.
/// - `inclusive`: `net = gross / (1 + rate_sum)`, `total_tax = gross - net`,
///   each tax's amount = `total_tax × rate / rate_sum`.
/// - exclusive: `net = gross`, each tax's amount = `net × rate`.
///
/// ## Example
/// ```rust
/// use bodega_core::money::Money;
/// use bodega_core::tax::decompose;
/// use bodega_core::types::Tax;
///
/// let iva = Tax {
///     id: "iva".into(),
///     name: "IVA".into(),
///     rate_bps: 1900,
///     is_fixed: false,
///     is_enabled: true,
/// };
/// let result = decompose(Money::from_cents(11900), &[iva], true);
/// assert_eq!(result.net.cents(), 10000);
/// assert_eq!(result.lines[0].amount.cents(), 1900);
/// ```
pub fn decompose(gross: Money, taxes: &[Tax], inclusive: bool) -> TaxDecomposition {
    let applicable: Vec<&Tax> = taxes
        .iter()
        .filter(|t| t.is_applicable_percentage())
        .collect();

    if applicable.is_empty() {
        return TaxDecomposition {
            net: gross,
            lines: Vec::new(),
        };
    }

    let rate_sum_bps: u32 = applicable.iter().map(|t| t.rate_bps as u32).sum();

    if inclusive {
        let net = gross.net_of_tax(rate_sum_bps);
        let total_tax = gross - net;
        let lines = applicable
            .iter()
            .map(|t| TaxLine {
                tax_id: t.id.clone(),
                rate: TaxRate::from_bps(t.rate_bps as u32),
                amount: total_tax.prorate(t.rate_bps, rate_sum_bps as i64),
            })
            .collect();
        TaxDecomposition { net, lines }
    } else {
        let lines = applicable
            .iter()
            .map(|t| TaxLine {
                tax_id: t.id.clone(),
                rate: TaxRate::from_bps(t.rate_bps as u32),
                amount: gross.calculate_tax(TaxRate::from_bps(t.rate_bps as u32)),
            })
            .collect();
        TaxDecomposition { net: gross, lines }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tax(id: &str, rate_bps: i64) -> Tax {
        Tax {
            id: id.to_string(),
            name: id.to_uppercase(),
            rate_bps,
            is_fixed: false,
            is_enabled: true,
        }
    }

    #[test]
    fn test_inclusive_single_tax_round_trip() {
        // Gross 119.00 with one 19% tax: net 100.00, one row of 19.00,
        // net + tax reconstructs the gross.
        let result = decompose(Money::from_cents(11900), &[tax("iva", 1900)], true);
        assert_eq!(result.net.cents(), 10000);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].amount.cents(), 1900);
        assert_eq!((result.net + result.total_tax()).cents(), 11900);
    }

    #[test]
    fn test_inclusive_multiple_taxes_apportioned_by_rate() {
        // 19% + 8% inclusive on 127.00 gross: net 100.00, tax 27.00 split
        // 19.00 / 8.00.
        let taxes = [tax("iva", 1900), tax("ico", 800)];
        let result = decompose(Money::from_cents(12700), &taxes, true);
        assert_eq!(result.net.cents(), 10000);
        assert_eq!(result.lines[0].amount.cents(), 1900);
        assert_eq!(result.lines[1].amount.cents(), 800);
    }

    #[test]
    fn test_exclusive_taxes() {
        let taxes = [tax("iva", 1900), tax("ico", 800)];
        let result = decompose(Money::from_cents(10000), &taxes, false);
        assert_eq!(result.net.cents(), 10000);
        assert_eq!(result.lines[0].amount.cents(), 1900);
        assert_eq!(result.lines[1].amount.cents(), 800);
    }

    #[test]
    fn test_fixed_and_disabled_taxes_excluded() {
        let mut fixed = tax("bolsa", 500);
        fixed.is_fixed = true;
        let mut disabled = tax("old", 1600);
        disabled.is_enabled = false;
        let zero = tax("exempt", 0);

        let result = decompose(Money::from_cents(11900), &[fixed, disabled, zero], true);
        assert_eq!(result.net.cents(), 11900);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn test_no_taxes_net_equals_gross() {
        let result = decompose(Money::from_cents(4200), &[], true);
        assert_eq!(result.net.cents(), 4200);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn test_prices_include_tax_out_always_true() {
        // Even an explicit false in the note cannot override OUT
        let note = r#"{"ivaIncludedInCost": false}"#;
        assert!(prices_include_tax(StockDirection::Out, Some(note)));
    }

    #[test]
    fn test_prices_include_tax_in_reads_note() {
        let no = r#"{"ivaIncludedInCost": false, "freight": 25000}"#;
        assert!(!prices_include_tax(StockDirection::In, Some(no)));

        let yes = r#"{"ivaIncludedInCost": true}"#;
        assert!(prices_include_tax(StockDirection::In, Some(yes)));
    }

    #[test]
    fn test_prices_include_tax_defaults_true() {
        assert!(prices_include_tax(StockDirection::In, None));
        assert!(prices_include_tax(StockDirection::In, Some("not json")));
        assert!(prices_include_tax(StockDirection::In, Some("{}")));
    }
}

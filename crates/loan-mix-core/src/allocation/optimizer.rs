//! Greedy loan-mix allocator.
//!
//! Offers are walked cheapest-first by cost per dollar and each one is drawn
//! as far as its cap allows until the target is met. There is no
//! backtracking: a cheap offer with a small cap is always filled before a
//! dearer one, even when a different split would cost less overall.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation::cost_model::rank_offers;
use crate::allocation::offer::{LoanOffer, MAX_AMOUNT};
use crate::types::{Money, Ratio};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What the target amount measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetBasis {
    /// Principal to borrow, before fees are withheld.
    #[default]
    GrossPrincipal,
    /// Cash to receive after fees; principal is grossed up per offer.
    NetCash,
}

/// Amount drawn from one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Zero-based position in the submitted offer list.
    pub offer_index: usize,
    /// Copy of the offer with its display name resolved.
    pub offer: LoanOffer,
    pub cost_per_dollar: Ratio,
    pub principal_used: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnusedReason {
    /// Fee of 100% or more, or a cap of zero.
    NoCapacity,
    /// The target was already covered by cheaper offers.
    TargetMet,
}

/// An offer the allocator walked past.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedOffer {
    pub offer_index: usize,
    pub name: String,
    pub cost_per_dollar: Ratio,
    pub reason: UnusedReason,
}

/// Raw greedy result before stats are attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Entries in selection order (ascending cost per dollar).
    pub entries: Vec<AllocationEntry>,
    /// Part of the target left uncovered, in the target's own basis.
    pub shortfall: Money,
    pub unused: Vec<UnusedOffer>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split `target` across `offers`, cheapest cost per dollar first.
///
/// Callers validate first: `target > 0`, offers non-empty, no negative rates
/// or fees. Degenerate offers are skipped rather than rejected.
pub fn allocate(target: Money, basis: TargetBasis, offers: &[LoanOffer]) -> Allocation {
    let mut remaining = target;
    let mut entries: Vec<AllocationEntry> = Vec::new();
    let mut unused: Vec<UnusedOffer> = Vec::new();

    for ranked in rank_offers(offers) {
        let offer = &offers[ranked.offer_index];
        let cpd = ranked.breakdown.cost_per_dollar;

        if remaining <= Decimal::ZERO {
            unused.push(UnusedOffer {
                offer_index: ranked.offer_index,
                name: ranked.name,
                cost_per_dollar: cpd,
                reason: UnusedReason::TargetMet,
            });
            continue;
        }

        let (principal, covered) = match basis {
            TargetBasis::GrossPrincipal => gross_draw(offer, remaining),
            TargetBasis::NetCash => net_draw(offer, remaining),
        };

        if principal <= Decimal::ZERO {
            log::debug!(
                "skipping {} (cpd {}): no usable capacity",
                ranked.name,
                cpd
            );
            unused.push(UnusedOffer {
                offer_index: ranked.offer_index,
                name: ranked.name,
                cost_per_dollar: cpd,
                reason: UnusedReason::NoCapacity,
            });
            continue;
        }

        remaining -= covered;
        log::debug!(
            "drawing {} from {} (cpd {}), {} remaining",
            principal,
            ranked.name,
            cpd,
            remaining
        );

        entries.push(AllocationEntry {
            offer_index: ranked.offer_index,
            offer: LoanOffer {
                name: ranked.name,
                ..offer.clone()
            },
            cost_per_dollar: cpd,
            principal_used: principal,
        });
    }

    Allocation {
        entries,
        shortfall: remaining.max(Decimal::ZERO),
        unused,
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Returns `(principal drawn, amount of target covered)`.
fn gross_draw(offer: &LoanOffer, remaining: Money) -> (Money, Money) {
    let capacity = offer.principal_capacity().unwrap_or(remaining);
    let used = capacity.min(remaining);
    (used, used)
}

/// Net-cash variant: the fee shrinks what each dollar of principal delivers,
/// so principal is `net / (1 - fee)` and the cap bounds principal, not cash.
///
/// A gross-up that overflows or exceeds `MAX_AMOUNT` is unusable; a capped
/// offer then still contributes its whole cap.
fn net_draw(offer: &LoanOffer, remaining: Money) -> (Money, Money) {
    let keep = Decimal::ONE - offer.fee_rate();
    if keep <= Decimal::ZERO {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let gross_up = remaining
        .checked_div(keep)
        .filter(|principal| *principal <= MAX_AMOUNT);

    match (offer.principal_capacity(), gross_up) {
        (Some(cap), Some(principal)) if principal <= cap => (principal, remaining),
        (Some(cap), _) if cap <= MAX_AMOUNT => match cap.checked_mul(keep) {
            Some(net) => (cap, net),
            None => (Decimal::ZERO, Decimal::ZERO),
        },
        (None, Some(principal)) => (principal, remaining),
        _ => (Decimal::ZERO, Decimal::ZERO),
    }
}

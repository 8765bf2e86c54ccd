//! Pure booking state-advance rules.
//!
//! The settlement subscriber recomputes `amount_paid` from payment rows and
//! asks this module which transition, if any, applies. Keeping the rules
//! pure keeps replayed payment events trivially idempotent: the same inputs
//! always produce the same (or no) advance.

use common::BookingStatus;

/// Snapshot of the fields the advance rules read.
#[derive(Clone, Copy, Debug)]
pub struct SettlementInput {
    pub status: BookingStatus,
    pub total_amount: i64,
    pub token_amount: i64,
    /// Freshly recomputed sum of completed payments.
    pub amount_paid: i64,
}

/// A state advance decided by the rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// pending → token_paid; sets `token_payment_date`.
    TokenPaid,
    /// → completed; sets `completion_date` and marks the property sold.
    Completed,
    /// confirmed → payment_in_progress.
    PaymentInProgress,
}

/// Evaluate the ordered advance rules; first match wins.
pub fn advance_for(input: &SettlementInput) -> Option<Advance> {
    if input.status.is_terminal() {
        return None;
    }

    if input.status == BookingStatus::Pending && input.amount_paid >= input.token_amount {
        return Some(Advance::TokenPaid);
    }
    if input.amount_paid >= input.total_amount {
        return Some(Advance::Completed);
    }
    if input.amount_paid > 0 && input.status == BookingStatus::Confirmed {
        return Some(Advance::PaymentInProgress);
    }

    None
}

impl Advance {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            Self::TokenPaid => BookingStatus::TokenPaid,
            Self::Completed => BookingStatus::Completed,
            Self::PaymentInProgress => BookingStatus::PaymentInProgress,
        }
    }
}

/// Whether a booking in this state may be cancelled.
pub fn can_cancel(status: BookingStatus) -> bool {
    !status.is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(status: BookingStatus, amount_paid: i64) -> SettlementInput {
        SettlementInput {
            status,
            total_amount: 5_000_000,
            token_amount: 250_000,
            amount_paid,
        }
    }

    #[test]
    fn token_payment_advances_pending_booking() {
        let advance = advance_for(&input(BookingStatus::Pending, 250_000));
        assert_eq!(advance, Some(Advance::TokenPaid));
    }

    #[test]
    fn partial_token_payment_does_not_advance() {
        assert_eq!(advance_for(&input(BookingStatus::Pending, 100_000)), None);
    }

    #[test]
    fn token_rule_wins_over_completion_while_pending() {
        // First match wins: a single full payment on a pending booking lands
        // on token_paid; the completion rule applies on the next evaluation.
        let advance = advance_for(&input(BookingStatus::Pending, 5_000_000));
        assert_eq!(advance, Some(Advance::TokenPaid));

        let advance = advance_for(&input(BookingStatus::TokenPaid, 5_000_000));
        assert_eq!(advance, Some(Advance::Completed));
    }

    #[test]
    fn full_payment_completes_from_any_live_state() {
        for status in [
            BookingStatus::TokenPaid,
            BookingStatus::Confirmed,
            BookingStatus::PaymentInProgress,
            BookingStatus::AgreementPending,
            BookingStatus::AgreementSigned,
        ] {
            assert_eq!(
                advance_for(&input(status, 5_000_000)),
                Some(Advance::Completed),
                "full payment should complete {status}"
            );
        }
    }

    #[test]
    fn partial_payment_on_confirmed_moves_to_in_progress() {
        let advance = advance_for(&input(BookingStatus::Confirmed, 1_000_000));
        assert_eq!(advance, Some(Advance::PaymentInProgress));
    }

    #[test]
    fn replay_is_a_no_op() {
        // S3: re-delivering the webhook recomputes the same amount_paid and
        // finds no applicable rule.
        assert_eq!(advance_for(&input(BookingStatus::TokenPaid, 250_000)), None);
        assert_eq!(
            advance_for(&input(BookingStatus::PaymentInProgress, 1_000_000)),
            None
        );
    }

    #[test]
    fn terminal_states_never_advance() {
        assert_eq!(advance_for(&input(BookingStatus::Completed, 5_000_000)), None);
        assert_eq!(advance_for(&input(BookingStatus::Cancelled, 5_000_000)), None);
    }

    #[test]
    fn overpayment_still_completes() {
        assert_eq!(
            advance_for(&input(BookingStatus::Confirmed, 5_100_000)),
            Some(Advance::Completed)
        );
    }

    #[test]
    fn cancel_allowed_only_before_terminal() {
        for status in BookingStatus::ACTIVE {
            assert!(can_cancel(*status));
        }
        assert!(!can_cancel(BookingStatus::Completed));
        assert!(!can_cancel(BookingStatus::Cancelled));
    }
}

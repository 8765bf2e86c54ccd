#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
    expected: &'static str,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid, self.expected
        )
    }
}

impl std::error::Error for ParseStatusError {}

macro_rules! status_enum {
    (
        $(#[$outer:meta])*
        $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
        #[cfg_attr(
            feature = "sea-orm",
            derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
            sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[cfg_attr(feature = "sea-orm", sea_orm(string_value = $value))]
                $variant,
            )+
        }

        impl $name {
            /// All possible values.
            pub const ALL: &'static [$name] = &[$(Self::$variant,)+];

            /// Returns the string representation (snake_case).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        invalid: s.to_string(),
                        expected: concat!($($value, " ",)+),
                    }),
                }
            }
        }
    };
}

status_enum! {
    /// Role attached to an authenticated principal.
    UserRole {
        /// Browses the catalog and creates bookings.
        Buyer => "buyer",
        /// Publishes projects and uploads construction evidence.
        Builder => "builder",
        /// Internal operator; passes every role check.
        Staff => "staff",
    }
}

status_enum! {
    /// Lifecycle of a real-estate project.
    ProjectStatus {
        Upcoming => "upcoming",
        Ongoing => "ongoing",
        Completed => "completed",
        Delayed => "delayed",
        Paused => "paused",
    }
}

status_enum! {
    /// Availability of a single unit within a project.
    PropertyStatus {
        Available => "available",
        Booked => "booked",
        Sold => "sold",
        Blocked => "blocked",
    }
}

status_enum! {
    /// Lifecycle of a construction milestone.
    MilestoneStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Delayed => "delayed",
        Verified => "verified",
    }
}

status_enum! {
    /// Booking lifecycle. Transitions are monotone: a booking never
    /// revisits an earlier state, and `completed`/`cancelled` are terminal.
    BookingStatus {
        /// Created, token payment not yet received.
        Pending => "pending",
        /// Token amount received.
        TokenPaid => "token_paid",
        /// Builder confirmed the reservation.
        Confirmed => "confirmed",
        /// Partial payments received after confirmation.
        PaymentInProgress => "payment_in_progress",
        AgreementPending => "agreement_pending",
        AgreementSigned => "agreement_signed",
        /// Fully paid. Terminal.
        Completed => "completed",
        /// Terminal.
        Cancelled => "cancelled",
    }
}

impl BookingStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// A booking in any non-terminal state holds its property.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// All states that count as "active" for the one-booking-per-property
    /// invariant.
    pub const ACTIVE: &'static [BookingStatus] = &[
        Self::Pending,
        Self::TokenPaid,
        Self::Confirmed,
        Self::PaymentInProgress,
        Self::AgreementPending,
        Self::AgreementSigned,
    ];
}

status_enum! {
    /// Payment lifecycle. pending → processing → completed | failed;
    /// completed → partially_refunded → refunded. Never downgrades.
    PaymentStatus {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Refunded => "refunded",
        PartiallyRefunded => "partially_refunded",
    }
}

impl PaymentStatus {
    /// Settlement is decided; only refund accounting may still move the state.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending | Self::Processing)
    }

    /// Whether a transition from `self` to `to` moves forward in the
    /// lifecycle. Self-transitions are not advances (replays are no-ops).
    pub fn can_advance_to(&self, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (self, to) {
            (Pending, Processing | Completed | Failed | Cancelled) => true,
            (Processing, Completed | Failed | Cancelled) => true,
            (Completed, PartiallyRefunded | Refunded) => true,
            (PartiallyRefunded, Refunded) => true,
            _ => false,
        }
    }
}

status_enum! {
    /// Lifecycle of a single refund against a payment.
    RefundStatus {
        Pending => "pending",
        Processed => "processed",
        Failed => "failed",
        Reversed => "reversed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trip_all_enums() {
        for status in BookingStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            let parsed: BookingStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(*status, parsed);
        }
        for status in PaymentStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            let parsed: PaymentStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn booking_status_from_str() {
        assert_eq!(
            "token_paid".parse::<BookingStatus>().unwrap(),
            BookingStatus::TokenPaid
        );
        assert!("TokenPaid".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn booking_terminal_states() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        for status in BookingStatus::ACTIVE {
            assert!(status.is_active(), "{status} should be active");
        }
        assert_eq!(
            BookingStatus::ACTIVE.len() + 2,
            BookingStatus::ALL.len(),
            "every status is either active or terminal"
        );
    }

    #[test]
    fn payment_advance_is_monotone() {
        use PaymentStatus::*;

        assert!(Pending.can_advance_to(Processing));
        assert!(Pending.can_advance_to(Completed));
        assert!(Processing.can_advance_to(Completed));
        assert!(Completed.can_advance_to(PartiallyRefunded));
        assert!(Completed.can_advance_to(Refunded));
        assert!(PartiallyRefunded.can_advance_to(Refunded));

        // No downgrades, ever.
        assert!(!Completed.can_advance_to(Failed));
        assert!(!Completed.can_advance_to(Pending));
        assert!(!Completed.can_advance_to(Processing));
        assert!(!Failed.can_advance_to(Completed));
        assert!(!Refunded.can_advance_to(PartiallyRefunded));

        // Replays are not advances.
        for s in PaymentStatus::ALL {
            assert!(!s.can_advance_to(*s), "{s} must not advance to itself");
        }
    }

    #[test]
    fn settled_statuses() {
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(!PaymentStatus::Processing.is_settled());
        assert!(PaymentStatus::Completed.is_settled());
        assert!(PaymentStatus::Failed.is_settled());
        assert!(PaymentStatus::Refunded.is_settled());
    }
}

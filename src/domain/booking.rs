use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub people_count: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub base_amount_cents: i64,
    pub total_amount_cents: i64,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// The lifecycle is Pending -> Approved -> Paid -> Completed, with
    /// Pending -> Rejected and {Pending, Approved} -> Cancelled as exits.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Paid)
                | (Approved, Cancelled)
                | (Paid, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }
}

/// Half-open interval intersection: [a_start, a_end) against [b_start, b_end).
/// Strict on both ends, so back-to-back slots (a.end == b.start) do not clash.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Price snapshot of a menu attached to a booking. Catalog edits after
/// confirmation never touch these rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingCateringLine {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub menu_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub special_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingServiceLine {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub price_type: super::PriceType,
}

/// Business-rule rejection. These are ordinary outcomes, not errors: the
/// request was well-formed, the rules just said no.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum BookingDenial {
    EndNotAfterStart,
    EventNotFound,
    EventInactive,
    InvalidPeopleCount { given: i32 },
    OverCapacity { requested: i32, capacity: i32 },
    SlotTaken { venue: String },
    SlotTakenInCart,
    EmptyCart,
    InvalidCartIndex,
    NotOwner,
    NotPayable { status: BookingStatus },
    InvalidTransition { from: BookingStatus, to: BookingStatus },
}

impl std::fmt::Display for BookingDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingDenial::EndNotAfterStart => {
                write!(f, "End time must be after start time.")
            }
            BookingDenial::EventNotFound => write!(f, "Event not found."),
            BookingDenial::EventInactive => write!(f, "This event is no longer available."),
            BookingDenial::InvalidPeopleCount { given } => {
                write!(f, "Number of people must be between 1 and 1000 (got {}).", given)
            }
            BookingDenial::OverCapacity { requested, capacity } => write!(
                f,
                "The venue holds at most {} people ({} requested).",
                capacity, requested
            ),
            BookingDenial::SlotTaken { venue } => {
                write!(f, "Booking for {} overlaps with an existing booking.", venue)
            }
            BookingDenial::SlotTakenInCart => {
                write!(f, "Selected time overlaps with an item already in your cart.")
            }
            BookingDenial::EmptyCart => {
                write!(f, "You must select at least one event to confirm your booking.")
            }
            BookingDenial::InvalidCartIndex => write!(f, "Invalid cart item."),
            BookingDenial::NotOwner => write!(f, "You may only manage your own bookings."),
            BookingDenial::NotPayable { status } => {
                write!(f, "Only approved bookings can be paid (status: {:?}).", status)
            }
            BookingDenial::InvalidTransition { from, to } => {
                write!(f, "A {:?} booking cannot become {:?}.", from, to)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
    }

    #[test]
    fn overlap_is_half_open() {
        // Plain intersection.
        assert!(overlaps(at(10), at(12), at(11), at(13)));
        // Containment, both directions.
        assert!(overlaps(at(10), at(14), at(11), at(12)));
        assert!(overlaps(at(11), at(12), at(10), at(14)));
        // Identical interval.
        assert!(overlaps(at(10), at(12), at(10), at(12)));
        // Back-to-back is allowed on both sides.
        assert!(!overlaps(at(10), at(12), at(12), at(13)));
        assert!(!overlaps(at(12), at(13), at(10), at(12)));
        // Disjoint.
        assert!(!overlaps(at(8), at(9), at(10), at(12)));
    }

    #[test]
    fn status_machine_forward_path() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Completed));
    }

    #[test]
    fn status_machine_exits() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(Cancelled));
        // Money already changed hands; no cancel after payment.
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Approved));
        assert!(!Pending.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states() {
        use BookingStatus::*;
        for s in [Rejected, Completed, Cancelled] {
            assert!(s.is_terminal());
        }
        for s in [Pending, Approved, Paid] {
            assert!(!s.is_terminal());
        }
    }
}

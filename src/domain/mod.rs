pub mod addon;
pub mod booking;
pub mod cart;
pub mod catering;
pub mod event;
pub mod package;
pub mod payment;
pub mod user;

pub use addon::{AdditionalService, PriceType};
pub use booking::{overlaps, Booking, BookingCateringLine, BookingDenial, BookingServiceLine, BookingStatus};
pub use cart::{Cart, CartCateringLine, CartEventLine, CartServiceLine};
pub use catering::{CateringMenu, MenuType};
pub use event::EventOffering;
pub use package::{Package, PackageItem};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use user::{CreateUserRequest, User, UserRole};

/// Render integer cents as a display amount, e.g. 123450 -> "R1234.50".
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}R{}.{:02}", sign, cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::format_cents;

    #[test]
    fn formats_cents_with_two_decimals() {
        assert_eq!(format_cents(0), "R0.00");
        assert_eq!(format_cents(50_00), "R50.00");
        assert_eq!(format_cents(123_45), "R123.45");
        assert_eq!(format_cents(5), "R0.05");
        assert_eq!(format_cents(-250), "-R2.50");
    }
}

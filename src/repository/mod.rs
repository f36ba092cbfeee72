use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod addon_repository;
pub mod booking_repository;
pub mod cart_repository;
pub mod catering_repository;
pub mod event_repository;
pub mod package_repository;
pub mod payment_repository;
pub mod user_repository;

pub use addon_repository::SqliteAdditionalServiceRepository;
pub use booking_repository::SqliteBookingRepository;
pub use cart_repository::SqliteCartRepository;
pub use catering_repository::SqliteCateringMenuRepository;
pub use event_repository::SqliteEventOfferingRepository;
pub use package_repository::SqlitePackageRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    async fn set_role(&self, id: Uuid, role: UserRole) -> Result<User>;
}

#[async_trait]
pub trait EventOfferingRepository: Send + Sync {
    async fn create(&self, event: EventOffering) -> Result<EventOffering>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<EventOffering>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<EventOffering>>;
    async fn list_active(&self) -> Result<Vec<EventOffering>>;
    async fn update(&self, id: Uuid, event: EventOffering) -> Result<EventOffering>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<()>;
    async fn count_active(&self) -> Result<i64>;
}

#[async_trait]
pub trait CateringMenuRepository: Send + Sync {
    async fn create(&self, menu: CateringMenu) -> Result<CateringMenu>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CateringMenu>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<CateringMenu>>;
    async fn list_active(&self) -> Result<Vec<CateringMenu>>;
    async fn update(&self, id: Uuid, menu: CateringMenu) -> Result<CateringMenu>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<()>;
}

#[async_trait]
pub trait AdditionalServiceRepository: Send + Sync {
    async fn create(&self, service: AdditionalService) -> Result<AdditionalService>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdditionalService>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AdditionalService>>;
    async fn list_active(&self) -> Result<Vec<AdditionalService>>;
    async fn update(&self, id: Uuid, service: AdditionalService) -> Result<AdditionalService>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<()>;
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn create(&self, package: Package, items: Vec<PackageItem>) -> Result<Package>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Package>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Package>>;
    async fn list_active(&self) -> Result<Vec<Package>>;
    async fn items_for(&self, package_id: Uuid) -> Result<Vec<PackageItem>>;
    async fn update(&self, id: Uuid, package: Package) -> Result<Package>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Any non-Cancelled booking on this event intersecting [start, end)?
    async fn has_overlap(
        &self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool>;

    /// Re-checks the overlap rule and inserts the booking with its child
    /// lines inside one transaction. Returns None when the slot was taken
    /// between the caller's check and the write.
    async fn create_if_slot_free(
        &self,
        booking: Booking,
        catering: Vec<BookingCateringLine>,
        services: Vec<BookingServiceLine>,
    ) -> Result<Option<Booking>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>>;
    async fn list_pending(&self) -> Result<Vec<Booking>>;
    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Booking>>;
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking>;
    async fn catering_for(&self, booking_id: Uuid) -> Result<Vec<BookingCateringLine>>;
    async fn services_for(&self, booking_id: Uuid) -> Result<Vec<BookingServiceLine>>;
    async fn count_all(&self) -> Result<i64>;
    async fn count_by_status(&self, status: BookingStatus) -> Result<i64>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn list_by_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>>;
    async fn completed_revenue_cents(&self) -> Result<i64>;
}

/// The session store's named-blob surface, holding one serialized cart
/// per session.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Cart>;
    async fn save(&self, session_id: &str, cart: &Cart) -> Result<()>;
    async fn clear(&self, session_id: &str) -> Result<()>;
}

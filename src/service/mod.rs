pub mod booking_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{AuthService, CsrfService};
use crate::mail::Notifier;
use crate::repository::*;
use booking_service::BookingService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub event_repo: Arc<dyn EventOfferingRepository>,
    pub catering_repo: Arc<dyn CateringMenuRepository>,
    pub service_repo: Arc<dyn AdditionalServiceRepository>,
    pub package_repo: Arc<dyn PackageRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub cart_repo: Arc<dyn CartRepository>,
    pub booking_service: Arc<BookingService>,
    pub auth_service: Arc<AuthService>,
    pub csrf_service: Arc<CsrfService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let event_repo: Arc<dyn EventOfferingRepository> =
            Arc::new(SqliteEventOfferingRepository::new(db_pool.clone()));
        let catering_repo: Arc<dyn CateringMenuRepository> =
            Arc::new(SqliteCateringMenuRepository::new(db_pool.clone()));
        let service_repo: Arc<dyn AdditionalServiceRepository> =
            Arc::new(SqliteAdditionalServiceRepository::new(db_pool.clone()));
        let package_repo: Arc<dyn PackageRepository> =
            Arc::new(SqlitePackageRepository::new(db_pool.clone()));
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let cart_repo: Arc<dyn CartRepository> =
            Arc::new(SqliteCartRepository::new(db_pool.clone()));

        let booking_service = Arc::new(BookingService::new(
            event_repo.clone(),
            catering_repo.clone(),
            service_repo.clone(),
            booking_repo.clone(),
            payment_repo.clone(),
            cart_repo.clone(),
            user_repo.clone(),
            notifier,
        ));

        let auth_service = Arc::new(AuthService::new(db_pool.clone()));
        let csrf_service = Arc::new(CsrfService::new(db_pool.clone()));

        Self {
            user_repo,
            event_repo,
            catering_repo,
            service_repo,
            package_repo,
            booking_repo,
            payment_repo,
            cart_repo,
            booking_service,
            auth_service,
            csrf_service,
            db_pool,
        }
    }
}

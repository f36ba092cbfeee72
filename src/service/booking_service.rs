use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    domain::{
        format_cents, Booking, BookingCateringLine, BookingDenial, BookingServiceLine,
        BookingStatus, Cart, CartCateringLine, CartEventLine, CartServiceLine, Payment,
        PaymentMethod, PaymentStatus, User,
    },
    error::Result,
    mail::Notifier,
    repository::{
        AdditionalServiceRepository, BookingRepository, CartRepository, CateringMenuRepository,
        EventOfferingRepository, PaymentRepository, UserRepository,
    },
};

/// Business outcome of an engine operation: the request was well-formed,
/// but the rules may still say no.
pub type Decision<T> = std::result::Result<T, BookingDenial>;

pub struct AddEventRequest {
    pub event_id: Uuid,
    pub people_count: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Confirmation {
    pub booking_ids: Vec<Uuid>,
    pub message: String,
}

/// Booking conflict and cart consolidation engine.
///
/// Owns the overlap rule and the one place cart lines become persisted
/// bookings. Everything else (identity, session blobs, mail) is a
/// collaborator passed in by trait.
pub struct BookingService {
    event_repo: Arc<dyn EventOfferingRepository>,
    catering_repo: Arc<dyn CateringMenuRepository>,
    service_repo: Arc<dyn AdditionalServiceRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    cart_repo: Arc<dyn CartRepository>,
    user_repo: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_repo: Arc<dyn EventOfferingRepository>,
        catering_repo: Arc<dyn CateringMenuRepository>,
        service_repo: Arc<dyn AdditionalServiceRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        cart_repo: Arc<dyn CartRepository>,
        user_repo: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            event_repo,
            catering_repo,
            service_repo,
            booking_repo,
            payment_repo,
            cart_repo,
            user_repo,
            notifier,
        }
    }

    pub async fn load_cart(&self, session_id: &str) -> Result<Cart> {
        self.cart_repo.load(session_id).await
    }

    /// Validate a proposed event line and append it to the session cart.
    /// Checks run in order: input shape, catalog state, the persisted
    /// booking table, then the cart itself. Nothing is written to the
    /// bookings table here.
    pub async fn add_event_to_cart(
        &self,
        session_id: &str,
        request: AddEventRequest,
    ) -> Result<Decision<Cart>> {
        if request.end_time <= request.start_time {
            return Ok(Err(BookingDenial::EndNotAfterStart));
        }

        let event = match self.event_repo.find_by_id(request.event_id).await? {
            Some(event) => event,
            None => return Ok(Err(BookingDenial::EventNotFound)),
        };
        if !event.is_active {
            return Ok(Err(BookingDenial::EventInactive));
        }

        if !(1..=1000).contains(&request.people_count) {
            return Ok(Err(BookingDenial::InvalidPeopleCount {
                given: request.people_count,
            }));
        }
        if request.people_count > event.max_capacity {
            return Ok(Err(BookingDenial::OverCapacity {
                requested: request.people_count,
                capacity: event.max_capacity,
            }));
        }

        if self
            .booking_repo
            .has_overlap(event.id, request.start_time, request.end_time)
            .await?
        {
            return Ok(Err(BookingDenial::SlotTaken { venue: event.venue }));
        }

        let mut cart = self.cart_repo.load(session_id).await?;
        if cart.has_overlap(event.id, request.start_time, request.end_time) {
            return Ok(Err(BookingDenial::SlotTakenInCart));
        }

        let total_cents = event.price_per_person_cents * request.people_count as i64;
        cart.events.push(CartEventLine {
            line_id: Uuid::new_v4(),
            event_id: event.id,
            event_name: event.name,
            venue: event.venue,
            people_count: request.people_count,
            start_time: request.start_time,
            end_time: request.end_time,
            base_amount_cents: total_cents,
            total_amount_cents: total_cents,
        });
        self.cart_repo.save(session_id, &cart).await?;

        Ok(Ok(cart))
    }

    pub async fn add_catering_to_cart(
        &self,
        session_id: &str,
        menu_id: Uuid,
        quantity: i32,
        special_instructions: String,
    ) -> Result<Decision<Cart>> {
        let menu = match self.catering_repo.find_by_id(menu_id).await? {
            Some(menu) => menu,
            None => return Ok(Err(BookingDenial::EventNotFound)),
        };
        if !menu.is_active {
            return Ok(Err(BookingDenial::EventInactive));
        }
        if !(1..=1000).contains(&quantity) {
            return Ok(Err(BookingDenial::InvalidPeopleCount { given: quantity }));
        }

        let mut cart = self.cart_repo.load(session_id).await?;
        cart.merge_catering(CartCateringLine {
            menu_id: menu.id,
            menu_name: menu.name,
            quantity,
            unit_price_cents: menu.price_per_person_cents,
            total_price_cents: menu.price_per_person_cents * quantity as i64,
            special_instructions,
            event_line: None,
        });
        self.cart_repo.save(session_id, &cart).await?;

        Ok(Ok(cart))
    }

    pub async fn add_service_to_cart(
        &self,
        session_id: &str,
        service_id: Uuid,
        quantity: i32,
    ) -> Result<Decision<Cart>> {
        let service = match self.service_repo.find_by_id(service_id).await? {
            Some(service) => service,
            None => return Ok(Err(BookingDenial::EventNotFound)),
        };
        if !service.is_active {
            return Ok(Err(BookingDenial::EventInactive));
        }
        if !(1..=1000).contains(&quantity) {
            return Ok(Err(BookingDenial::InvalidPeopleCount { given: quantity }));
        }

        let mut cart = self.cart_repo.load(session_id).await?;
        cart.services.push(CartServiceLine {
            service_id: service.id,
            service_name: service.name,
            quantity,
            unit_price_cents: service.price_cents,
            total_price_cents: service.price_cents * quantity as i64,
            price_type: service.price_type,
            event_line: None,
        });
        self.cart_repo.save(session_id, &cart).await?;

        Ok(Ok(cart))
    }

    pub async fn remove_event_from_cart(
        &self,
        session_id: &str,
        index: usize,
    ) -> Result<Decision<Cart>> {
        let mut cart = self.cart_repo.load(session_id).await?;
        if !cart.remove_event(index) {
            return Ok(Err(BookingDenial::InvalidCartIndex));
        }
        self.cart_repo.save(session_id, &cart).await?;
        Ok(Ok(cart))
    }

    pub async fn remove_catering_from_cart(
        &self,
        session_id: &str,
        index: usize,
    ) -> Result<Decision<Cart>> {
        let mut cart = self.cart_repo.load(session_id).await?;
        if !cart.remove_catering(index) {
            return Ok(Err(BookingDenial::InvalidCartIndex));
        }
        self.cart_repo.save(session_id, &cart).await?;
        Ok(Ok(cart))
    }

    pub async fn remove_service_from_cart(
        &self,
        session_id: &str,
        index: usize,
    ) -> Result<Decision<Cart>> {
        let mut cart = self.cart_repo.load(session_id).await?;
        if !cart.remove_service(index) {
            return Ok(Err(BookingDenial::InvalidCartIndex));
        }
        self.cart_repo.save(session_id, &cart).await?;
        Ok(Ok(cart))
    }

    /// Convert the session cart into persisted bookings, one per event line,
    /// in cart order.
    ///
    /// The overlap rule is re-checked per line against the live booking
    /// table inside the insert transaction; a conflicting line aborts the
    /// rest of the pass, but lines already written stay written and the cart
    /// is left untouched for the caller to inspect. Only a fully successful
    /// pass clears the carts.
    pub async fn confirm_cart(&self, session_id: &str, user: &User) -> Result<Decision<Confirmation>> {
        let cart = self.cart_repo.load(session_id).await?;
        if cart.events.is_empty() {
            return Ok(Err(BookingDenial::EmptyCart));
        }

        let now = Utc::now();
        let mut booking_ids = Vec::with_capacity(cart.events.len());

        for (i, line) in cart.events.iter().enumerate() {
            let booking_id = Uuid::new_v4();

            let catering_lines: Vec<BookingCateringLine> = cart
                .catering_for(line, i == 0)
                .into_iter()
                .map(|c| BookingCateringLine {
                    id: Uuid::new_v4(),
                    booking_id,
                    menu_id: c.menu_id,
                    quantity: c.quantity,
                    unit_price_cents: c.unit_price_cents,
                    total_price_cents: c.unit_price_cents * c.quantity as i64,
                    special_instructions: c.special_instructions.clone(),
                })
                .collect();

            let service_lines: Vec<BookingServiceLine> = cart
                .services_for(line, i == 0)
                .into_iter()
                .map(|s| BookingServiceLine {
                    id: Uuid::new_v4(),
                    booking_id,
                    service_id: s.service_id,
                    quantity: s.quantity,
                    unit_price_cents: s.unit_price_cents,
                    total_price_cents: s.unit_price_cents * s.quantity as i64,
                    price_type: s.price_type,
                })
                .collect();

            let booking = Booking {
                id: booking_id,
                user_id: user.id,
                event_id: line.event_id,
                people_count: line.people_count,
                start_time: line.start_time,
                end_time: line.end_time,
                base_amount_cents: line.base_amount_cents,
                total_amount_cents: line.total_amount_cents,
                status: BookingStatus::Pending,
                booked_at: now,
                approved_at: None,
                paid_at: None,
            };

            let created = self
                .booking_repo
                .create_if_slot_free(booking, catering_lines, service_lines)
                .await?;

            match created {
                Some(booking) => {
                    booking_ids.push(booking.id);
                    self.notify(
                        &user.email,
                        &format!("Booking Confirmation - {}", line.event_name),
                        &confirmation_body(user, line),
                    )
                    .await;
                }
                None => {
                    return Ok(Err(BookingDenial::SlotTaken {
                        venue: line.venue.clone(),
                    }));
                }
            }
        }

        self.cart_repo.clear(session_id).await?;

        Ok(Ok(Confirmation {
            booking_ids,
            message: "Your booking has been confirmed successfully! Confirmation email sent."
                .to_string(),
        }))
    }

    pub async fn approve_booking(&self, admin: &User, id: Uuid) -> Result<Decision<Booking>> {
        self.decide_booking(admin, id, BookingStatus::Approved).await
    }

    pub async fn reject_booking(&self, admin: &User, id: Uuid) -> Result<Decision<Booking>> {
        self.decide_booking(admin, id, BookingStatus::Rejected).await
    }

    pub async fn complete_booking(&self, admin: &User, id: Uuid) -> Result<Decision<Booking>> {
        self.decide_booking(admin, id, BookingStatus::Completed).await
    }

    /// Owner may cancel before completion; admins may cancel anything
    /// cancellable. Paid and Completed bookings stay put.
    pub async fn cancel_booking(&self, user: &User, id: Uuid) -> Result<Decision<Booking>> {
        let booking = match self.booking_repo.find_by_id(id).await? {
            Some(booking) => booking,
            None => return Ok(Err(BookingDenial::EventNotFound)),
        };

        if booking.user_id != user.id && !user.is_admin() {
            return Ok(Err(BookingDenial::NotOwner));
        }
        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Ok(Err(BookingDenial::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Cancelled,
            }));
        }

        let updated = self
            .booking_repo
            .update_status(id, BookingStatus::Cancelled)
            .await?;

        if let Some(owner) = self.user_repo.find_by_id(booking.user_id).await? {
            self.notify(
                &owner.email,
                "Booking Cancelled",
                &status_change_body(&owner, &updated, "cancelled"),
            )
            .await;
        }

        Ok(Ok(updated))
    }

    /// Simulated capture: only an Approved booking owned by the caller can
    /// be paid. Amount is the event total plus all child-line totals.
    pub async fn pay_booking(
        &self,
        user: &User,
        id: Uuid,
        method: PaymentMethod,
    ) -> Result<Decision<Payment>> {
        let booking = match self.booking_repo.find_by_id(id).await? {
            Some(booking) => booking,
            None => return Ok(Err(BookingDenial::EventNotFound)),
        };

        if booking.user_id != user.id {
            return Ok(Err(BookingDenial::NotOwner));
        }
        if booking.status != BookingStatus::Approved {
            return Ok(Err(BookingDenial::NotPayable {
                status: booking.status,
            }));
        }

        let amount_cents = self.amount_due_cents(&booking).await?;

        let payment = self
            .payment_repo
            .create(Payment {
                id: Uuid::new_v4(),
                booking_id: booking.id,
                amount_cents,
                method,
                status: PaymentStatus::Completed,
                transaction_id: generate_transaction_id(),
                notes: format!("Payment processed via {:?}", method),
                paid_at: Utc::now(),
            })
            .await?;

        self.booking_repo
            .update_status(booking.id, BookingStatus::Paid)
            .await?;

        self.notify(
            &user.email,
            "Payment Confirmation",
            &payment_body(user, &payment),
        )
        .await;

        Ok(Ok(payment))
    }

    /// Event amount plus catering and service line totals.
    pub async fn amount_due_cents(&self, booking: &Booking) -> Result<i64> {
        let catering: i64 = self
            .booking_repo
            .catering_for(booking.id)
            .await?
            .iter()
            .map(|c| c.total_price_cents)
            .sum();
        let services: i64 = self
            .booking_repo
            .services_for(booking.id)
            .await?
            .iter()
            .map(|s| s.total_price_cents)
            .sum();

        Ok(booking.total_amount_cents + catering + services)
    }

    async fn decide_booking(
        &self,
        admin: &User,
        id: Uuid,
        next: BookingStatus,
    ) -> Result<Decision<Booking>> {
        // Approval authority is an access-control matter, not a business
        // outcome; staff without the admin role get a hard 403.
        if !admin.is_admin() {
            return Err(crate::error::AppError::Forbidden);
        }

        let booking = match self.booking_repo.find_by_id(id).await? {
            Some(booking) => booking,
            None => return Ok(Err(BookingDenial::EventNotFound)),
        };
        if !booking.status.can_transition_to(next) {
            return Ok(Err(BookingDenial::InvalidTransition {
                from: booking.status,
                to: next,
            }));
        }

        let updated = self.booking_repo.update_status(id, next).await?;

        if matches!(next, BookingStatus::Approved | BookingStatus::Rejected) {
            let verdict = if next == BookingStatus::Approved { "approved" } else { "rejected" };
            if let Some(owner) = self.user_repo.find_by_id(booking.user_id).await? {
                self.notify(
                    &owner.email,
                    &format!("Booking {}", capitalize(verdict)),
                    &status_change_body(&owner, &updated, verdict),
                )
                .await;
            }
        }

        Ok(Ok(updated))
    }

    /// Delivery is best-effort: a dead SMTP relay must never unwind a
    /// booking that is already on disk.
    async fn notify(&self, to: &str, subject: &str, body: &str) {
        if let Err(e) = self.notifier.send(to, subject, body).await {
            tracing::warn!("Failed to send \"{}\" to {}: {}", subject, to, e);
        }
    }
}

fn generate_transaction_id() -> String {
    use rand::Rng;
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("TXN{}{}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn confirmation_body(user: &User, line: &CartEventLine) -> String {
    format!(
        "Dear {},<br/><br/>\
         Your booking for <b>{}</b> has been received.<br/>\
         Number of People: {}<br/>\
         Event Start: {}<br/>\
         Event End: {}<br/>\
         Total Amount: {}<br/><br/>\
         Thank you for booking with us!",
        user.full_name,
        line.event_name,
        line.people_count,
        line.start_time.format("%b %d, %Y %H:%M"),
        line.end_time.format("%b %d, %Y %H:%M"),
        format_cents(line.total_amount_cents),
    )
}

fn status_change_body(user: &User, booking: &Booking, verdict: &str) -> String {
    format!(
        "Dear {},<br/><br/>\
         Your booking has been <b>{}</b>.<br/>\
         Event Start: {}<br/>\
         Event End: {}<br/>\
         Number of People: {}<br/>\
         Total Amount: {}<br/><br/>\
         Thank you for booking with us!",
        user.full_name,
        verdict,
        booking.start_time.format("%b %d, %Y %H:%M"),
        booking.end_time.format("%b %d, %Y %H:%M"),
        booking.people_count,
        format_cents(booking.total_amount_cents),
    )
}

fn payment_body(user: &User, payment: &Payment) -> String {
    format!(
        "Dear {},<br/><br/>\
         Your payment has been successfully processed.<br/>\
         Amount Paid: {}<br/>\
         Payment Method: {:?}<br/>\
         Transaction ID: {}<br/><br/>\
         Thank you for booking with us!",
        user.full_name,
        format_cents(payment.amount_cents),
        payment.method,
        payment.transaction_id,
    )
}

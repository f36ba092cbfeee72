use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{overlaps, PriceType};

/// Session-scoped cart: three parallel collections of not-yet-persisted
/// candidate lines. A plain value object; it is loaded from the session
/// store, mutated, and written back explicitly by its callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub events: Vec<CartEventLine>,
    pub catering: Vec<CartCateringLine>,
    pub services: Vec<CartServiceLine>,
}

/// A candidate booking. `line_id` exists only so catering/service lines can
/// point at the event line they belong to before anything has a booking id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEventLine {
    pub line_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub venue: String,
    pub people_count: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub base_amount_cents: i64,
    pub total_amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCateringLine {
    pub menu_id: Uuid,
    pub menu_name: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub special_instructions: String,
    /// Event line this menu belongs to; None attaches to the first
    /// event line at confirmation.
    pub event_line: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartServiceLine {
    pub service_id: Uuid,
    pub service_name: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub price_type: PriceType,
    pub event_line: Option<Uuid>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.catering.is_empty() && self.services.is_empty()
    }

    /// Total line count across all three collections (the cart badge).
    pub fn item_count(&self) -> usize {
        self.events.len() + self.catering.len() + self.services.len()
    }

    /// Does any event line already in the cart clash with the proposal?
    /// Same half-open test the booking table check uses.
    pub fn has_overlap(
        &self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> bool {
        self.events
            .iter()
            .any(|l| l.event_id == event_id && overlaps(start, end, l.start_time, l.end_time))
    }

    /// Adding a menu already in the cart bumps its quantity instead of
    /// creating a duplicate line.
    pub fn merge_catering(&mut self, line: CartCateringLine) {
        if let Some(existing) = self.catering.iter_mut().find(|c| c.menu_id == line.menu_id) {
            existing.quantity += line.quantity;
            existing.total_price_cents = existing.unit_price_cents * existing.quantity as i64;
        } else {
            self.catering.push(line);
        }
    }

    pub fn remove_event(&mut self, index: usize) -> bool {
        if index >= self.events.len() {
            return false;
        }
        let removed = self.events.remove(index);
        // Orphaned child lines fall back to first-event attachment.
        for c in &mut self.catering {
            if c.event_line == Some(removed.line_id) {
                c.event_line = None;
            }
        }
        for s in &mut self.services {
            if s.event_line == Some(removed.line_id) {
                s.event_line = None;
            }
        }
        true
    }

    pub fn remove_catering(&mut self, index: usize) -> bool {
        if index >= self.catering.len() {
            return false;
        }
        self.catering.remove(index);
        true
    }

    pub fn remove_service(&mut self, index: usize) -> bool {
        if index >= self.services.len() {
            return false;
        }
        self.services.remove(index);
        true
    }

    /// Catering lines belonging to an event line: explicit association, or
    /// unattached lines when the line is the cart's first event.
    pub fn catering_for(&self, line: &CartEventLine, is_first: bool) -> Vec<&CartCateringLine> {
        self.catering
            .iter()
            .filter(|c| c.event_line == Some(line.line_id) || (is_first && c.event_line.is_none()))
            .collect()
    }

    pub fn services_for(&self, line: &CartEventLine, is_first: bool) -> Vec<&CartServiceLine> {
        self.services
            .iter()
            .filter(|s| s.event_line == Some(line.line_id) || (is_first && s.event_line.is_none()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap()
    }

    fn event_line(event_id: Uuid, start: u32, end: u32) -> CartEventLine {
        CartEventLine {
            line_id: Uuid::new_v4(),
            event_id,
            event_name: "Main Hall Gala".into(),
            venue: "Main Hall".into(),
            people_count: 10,
            start_time: at(start),
            end_time: at(end),
            base_amount_cents: 500_00,
            total_amount_cents: 500_00,
        }
    }

    #[test]
    fn overlap_only_against_same_event() {
        let event_a = Uuid::new_v4();
        let event_b = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.events.push(event_line(event_a, 10, 12));

        assert!(cart.has_overlap(event_a, at(11), at(13)));
        // Adjacency is fine.
        assert!(!cart.has_overlap(event_a, at(12), at(13)));
        // A different event in the same window is fine.
        assert!(!cart.has_overlap(event_b, at(11), at(13)));
    }

    #[test]
    fn catering_merges_by_menu() {
        let menu_id = Uuid::new_v4();
        let mut cart = Cart::default();
        let line = CartCateringLine {
            menu_id,
            menu_name: "Premium Buffet".into(),
            quantity: 3,
            unit_price_cents: 20_00,
            total_price_cents: 60_00,
            special_instructions: String::new(),
            event_line: None,
        };
        cart.merge_catering(line.clone());
        cart.merge_catering(CartCateringLine { quantity: 2, ..line });

        assert_eq!(cart.catering.len(), 1);
        assert_eq!(cart.catering[0].quantity, 5);
        assert_eq!(cart.catering[0].total_price_cents, 100_00);
    }

    #[test]
    fn remove_event_detaches_children() {
        let mut cart = Cart::default();
        let line = event_line(Uuid::new_v4(), 10, 12);
        let line_id = line.line_id;
        cart.events.push(line);
        cart.services.push(CartServiceLine {
            service_id: Uuid::new_v4(),
            service_name: "Floral Decor".into(),
            quantity: 1,
            unit_price_cents: 150_00,
            total_price_cents: 150_00,
            price_type: PriceType::Fixed,
            event_line: Some(line_id),
        });

        assert!(cart.remove_event(0));
        assert!(cart.events.is_empty());
        assert_eq!(cart.services[0].event_line, None);
        // Out-of-range index is reported, not a panic.
        assert!(!cart.remove_event(5));
    }

    #[test]
    fn unattached_children_follow_first_event_line() {
        let mut cart = Cart::default();
        let first = event_line(Uuid::new_v4(), 10, 12);
        let second = event_line(Uuid::new_v4(), 14, 16);
        cart.events.push(first.clone());
        cart.events.push(second.clone());
        cart.catering.push(CartCateringLine {
            menu_id: Uuid::new_v4(),
            menu_name: "Standard Buffet".into(),
            quantity: 4,
            unit_price_cents: 10_00,
            total_price_cents: 40_00,
            special_instructions: String::new(),
            event_line: None,
        });

        assert_eq!(cart.catering_for(&first, true).len(), 1);
        assert_eq!(cart.catering_for(&second, false).len(), 0);
    }
}

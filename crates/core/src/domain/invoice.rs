use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::booking::{BookingId, TravelRequest, UserId};
use crate::domain::option::{Leg, TransportMode};
use crate::domain::session::SessionId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCategory {
    Flight,
    Hotel,
    Train,
}

impl InvoiceCategory {
    /// Hotel legs are always hotel invoices; transport legs follow the selected option's mode.
    pub fn for_leg(leg: Leg, mode: Option<TransportMode>) -> Self {
        match (leg, mode) {
            (Leg::Hotel, _) => Self::Hotel,
            (_, Some(TransportMode::Train)) => Self::Train,
            _ => Self::Flight,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub user_id: UserId,
    pub booking_id: BookingId,
    pub session_id: SessionId,
    pub category: InvoiceCategory,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketSubmissionReceipt {
    pub invoices: Vec<Invoice>,
    pub uploaded_count: usize,
}

/// One page of the ticket issuer's work queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingPage {
    pub travel_requests: Vec<TravelRequest>,
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

impl BookingPage {
    pub fn page_count(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BookingPage, InvoiceCategory};
    use crate::domain::option::{Leg, TransportMode};

    #[test]
    fn category_follows_leg_and_mode() {
        assert_eq!(InvoiceCategory::for_leg(Leg::Hotel, None), InvoiceCategory::Hotel);
        assert_eq!(
            InvoiceCategory::for_leg(Leg::Onward, Some(TransportMode::Train)),
            InvoiceCategory::Train
        );
        assert_eq!(InvoiceCategory::for_leg(Leg::Return, None), InvoiceCategory::Flight);
    }

    #[test]
    fn page_count_rounds_up_and_tolerates_missing_paging_fields() {
        let page: BookingPage =
            serde_json::from_value(json!({ "travel_requests": [], "total": 21 }))
                .expect("decode page");
        assert_eq!((page.page, page.size), (1, 10));
        assert_eq!(page.page_count(), 3);

        let empty = BookingPage { size: 0, ..page };
        assert_eq!(empty.page_count(), 0);
    }
}

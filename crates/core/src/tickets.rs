use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::booking::{BookingId, TravelRequest};
use crate::domain::option::Leg;
use crate::errors::DomainError;

/// A proof-of-purchase file attached to one leg.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl TicketDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_owned();
        Self { file_name, content_type, bytes }
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Invoice amount per leg, taken from the booking's selected options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegAmounts {
    #[serde(with = "rust_decimal::serde::float")]
    pub onward: Decimal,
    #[serde(rename = "return", with = "rust_decimal::serde::float")]
    pub return_trip: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub hotel: Decimal,
}

impl LegAmounts {
    pub fn for_booking(booking: &TravelRequest) -> Self {
        Self {
            onward: booking.leg_amount(Leg::Onward),
            return_trip: booking.leg_amount(Leg::Return),
            hotel: booking.leg_amount(Leg::Hotel),
        }
    }

    pub fn get(&self, leg: Leg) -> Decimal {
        match leg {
            Leg::Onward => self.onward,
            Leg::Return => self.return_trip,
            Leg::Hotel => self.hotel,
        }
    }

    pub fn total(&self) -> Decimal {
        self.onward + self.return_trip + self.hotel
    }
}

/// Everything sent in one ticket upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketSubmission {
    pub files: BTreeMap<Leg, TicketDocument>,
    pub amounts: LegAmounts,
}

/// Ticket files held per booking until a submission succeeds.
#[derive(Clone, Debug, Default)]
pub struct TicketStaging {
    bookings: HashMap<BookingId, BTreeMap<Leg, TicketDocument>>,
}

impl TicketStaging {
    /// Stages `document` for `leg`; `None` unstages it. A booking left with no
    /// files loses its entry.
    pub fn stage(&mut self, booking_id: &BookingId, leg: Leg, document: Option<TicketDocument>) {
        match document {
            Some(document) => {
                self.bookings.entry(booking_id.clone()).or_default().insert(leg, document);
            }
            None => {
                if let Some(files) = self.bookings.get_mut(booking_id) {
                    files.remove(&leg);
                    if files.is_empty() {
                        self.bookings.remove(booking_id);
                    }
                }
            }
        }
    }

    pub fn staged(&self, booking_id: &BookingId) -> Option<&BTreeMap<Leg, TicketDocument>> {
        self.bookings.get(booking_id)
    }

    pub fn has_entry(&self, booking_id: &BookingId) -> bool {
        self.bookings.contains_key(booking_id)
    }

    pub fn missing_legs(&self, booking_id: &BookingId) -> Vec<Leg> {
        let staged = self.staged(booking_id);
        Leg::ALL
            .into_iter()
            .filter(|leg| !staged.is_some_and(|files| files.contains_key(leg)))
            .collect()
    }

    /// Builds the upload for `booking`, refusing unless all three legs are staged.
    pub fn prepare(&self, booking: &TravelRequest) -> Result<TicketSubmission, DomainError> {
        let missing = self.missing_legs(&booking.id);
        if !missing.is_empty() {
            return Err(DomainError::MissingTicketFiles { missing });
        }
        let files = self.staged(&booking.id).cloned().unwrap_or_default();
        Ok(TicketSubmission { files, amounts: LegAmounts::for_booking(booking) })
    }

    pub fn clear(&mut self, booking_id: &BookingId) {
        self.bookings.remove(booking_id);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::option::Leg;
    use crate::errors::DomainError;
    use crate::fixtures::{booking_fixture, flight, hotel};

    use super::{LegAmounts, TicketDocument, TicketStaging};

    fn pdf(name: &str) -> TicketDocument {
        TicketDocument::new(format!("{name}.pdf"), b"%PDF-1.7".to_vec())
    }

    #[test]
    fn hotel_amount_uses_total_stay_cost_not_nightly_rate() {
        let mut booking = booking_fixture(
            vec![flight("AI-101", 450), flight("AI-103", 500)],
            vec![],
            vec![hotel("Harbour View", 400, 1_200)],
        );
        booking.selected_onward_index = Some(1);
        booking.selected_hotel_index = Some(0);

        let amounts = LegAmounts::for_booking(&booking);
        assert_eq!(amounts.onward, Decimal::new(500, 0));
        assert_eq!(amounts.return_trip, Decimal::ZERO);
        assert_eq!(amounts.hotel, Decimal::new(1_200, 0));
        assert_eq!(amounts.total(), booking.total_selected_cost());
    }

    #[test]
    fn submission_requires_all_three_files() {
        let booking = booking_fixture(vec![], vec![], vec![]);
        let mut staging = TicketStaging::default();
        staging.stage(&booking.id, Leg::Onward, Some(pdf("onward")));
        staging.stage(&booking.id, Leg::Hotel, Some(pdf("hotel")));

        let error = staging.prepare(&booking).expect_err("return file missing");
        assert_eq!(error, DomainError::MissingTicketFiles { missing: vec![Leg::Return] });
        assert_eq!(
            error.to_string(),
            "Please upload all 3 files (Onward, Return, and Hotel) before submitting."
        );

        staging.stage(&booking.id, Leg::Return, Some(pdf("return")));
        let submission = staging.prepare(&booking).expect("all staged");
        assert_eq!(submission.files.len(), 3);
        assert!(staging.has_entry(&booking.id));
    }

    #[test]
    fn unstaging_the_last_file_drops_the_booking_entry() {
        let booking = booking_fixture(vec![], vec![], vec![]);
        let mut staging = TicketStaging::default();
        staging.stage(&booking.id, Leg::Hotel, Some(pdf("hotel")));
        staging.stage(&booking.id, Leg::Hotel, None);

        assert!(!staging.has_entry(&booking.id));
        assert_eq!(staging.missing_legs(&booking.id), Leg::ALL.to_vec());
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(pdf("a").content_type, "application/pdf");
        assert_eq!(TicketDocument::new("scan.JPG", vec![]).content_type, "image/jpeg");
        assert_eq!(TicketDocument::new("ticket", vec![]).content_type, "application/octet-stream");
    }

    #[test]
    fn amounts_serialize_as_numbers_keyed_by_leg() {
        let amounts = LegAmounts {
            onward: Decimal::new(300, 0),
            return_trip: Decimal::ZERO,
            hotel: Decimal::new(900, 0),
        };
        let encoded = serde_json::to_value(amounts).expect("encode amounts");
        assert_eq!(encoded, serde_json::json!({ "onward": 300.0, "return": 0.0, "hotel": 900.0 }));
    }
}

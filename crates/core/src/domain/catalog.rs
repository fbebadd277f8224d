use crate::domain::booking::TravelRequest;
use crate::domain::option::{Leg, TravelOption};

/// The three per-leg option lists attached to a booking when it is created.
///
/// Catalogs never change after creation, so a copy taken at load time stays
/// valid for the lifetime of a view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionCatalog {
    onward: Vec<TravelOption>,
    return_options: Vec<TravelOption>,
    hotel: Vec<TravelOption>,
}

impl OptionCatalog {
    pub fn new(
        onward: Vec<TravelOption>,
        return_options: Vec<TravelOption>,
        hotel: Vec<TravelOption>,
    ) -> Self {
        Self { onward, return_options, hotel }
    }

    pub fn from_booking(booking: &TravelRequest) -> Self {
        Self::new(
            booking.onward_options.clone(),
            booking.return_options.clone(),
            booking.hotel_options.clone(),
        )
    }

    pub fn options(&self, leg: Leg) -> &[TravelOption] {
        match leg {
            Leg::Onward => &self.onward,
            Leg::Return => &self.return_options,
            Leg::Hotel => &self.hotel,
        }
    }

    pub fn is_empty(&self, leg: Leg) -> bool {
        self.options(leg).is_empty()
    }

    /// Position of the first catalog entry equal to `option`.
    pub fn position(&self, leg: Leg, option: &TravelOption) -> Option<usize> {
        self.options(leg).iter().position(|candidate| candidate == option)
    }

    pub fn get(&self, leg: Leg, index: usize) -> Option<&TravelOption> {
        self.options(leg).get(index)
    }
}

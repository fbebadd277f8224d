use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::booking::{SelectionIndices, TravelRequest};
use crate::domain::catalog::OptionCatalog;
use crate::domain::option::{Leg, TravelOption};
use crate::errors::DomainError;

/// Which legs need a pick before selections can be submitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Every leg needs a pick, even when its catalog is empty.
    RequireAllLegs,
    /// A leg with no options is already satisfied.
    #[default]
    ExemptEmptyCatalogs,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequireAllLegs => "require_all_legs",
            Self::ExemptEmptyCatalogs => "exempt_empty_catalogs",
        }
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "require_all_legs" => Ok(Self::RequireAllLegs),
            "exempt_empty_catalogs" => Ok(Self::ExemptEmptyCatalogs),
            other => Err(format!(
                "unsupported selection policy `{other}` (expected require_all_legs|exempt_empty_catalogs)"
            )),
        }
    }
}

/// The traveler's in-progress choice of one option per leg.
///
/// Picks are held as catalog positions, so equal offers at different
/// positions stay distinct.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionManager {
    catalog: OptionCatalog,
    policy: SelectionPolicy,
    picks: BTreeMap<Leg, usize>,
}

impl SelectionManager {
    pub fn new(catalog: OptionCatalog, policy: SelectionPolicy) -> Self {
        Self { catalog, policy, picks: BTreeMap::new() }
    }

    /// Seeds the working selection from the booking's persisted indices.
    pub fn for_booking(booking: &TravelRequest, policy: SelectionPolicy) -> Self {
        let mut manager = Self::new(OptionCatalog::from_booking(booking), policy);
        let indices = booking.selection_indices();
        for leg in Leg::ALL {
            let index = indices.get(leg).filter(|index| manager.catalog.get(leg, *index).is_some());
            if let Some(index) = index {
                manager.picks.insert(leg, index);
            }
        }
        manager
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Picks by value; equal offers resolve to the first matching position.
    pub fn select_option(&mut self, leg: Leg, option: &TravelOption) -> Result<(), DomainError> {
        let index =
            self.catalog.position(leg, option).ok_or(DomainError::OptionNotInCatalog { leg })?;
        self.picks.insert(leg, index);
        Ok(())
    }

    pub fn select_index(&mut self, leg: Leg, index: usize) -> Result<(), DomainError> {
        let len = self.catalog.options(leg).len();
        if index >= len {
            return Err(DomainError::SelectionIndexOutOfRange { leg, index, len });
        }
        self.picks.insert(leg, index);
        Ok(())
    }

    pub fn clear(&mut self, leg: Leg) {
        self.picks.remove(&leg);
    }

    pub fn selected_index(&self, leg: Leg) -> Option<usize> {
        self.picks.get(&leg).copied()
    }

    pub fn selected(&self, leg: Leg) -> Option<&TravelOption> {
        self.selected_index(leg).and_then(|index| self.catalog.get(leg, index))
    }

    pub fn missing_legs(&self) -> Vec<Leg> {
        Leg::ALL
            .into_iter()
            .filter(|leg| !self.picks.contains_key(leg))
            .filter(|leg| match self.policy {
                SelectionPolicy::RequireAllLegs => true,
                SelectionPolicy::ExemptEmptyCatalogs => !self.catalog.is_empty(*leg),
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_legs().is_empty()
    }

    pub fn to_persisted_indices(&self) -> SelectionIndices {
        let mut indices = SelectionIndices::default();
        for (leg, index) in &self.picks {
            indices.set(*leg, Some(*index));
        }
        indices
    }
}

//! Compiled-in Flybus knowledge base.
//!
//! Loaded once, validated, then shared read-only (`Arc<FactStore>`) by every
//! retriever. Nothing here performs I/O.

pub mod locations;
pub mod policies;
pub mod pricing;
pub mod schedule;

use serde::Serialize;

use crate::error::KnowledgeError;

pub use locations::{Area, BusStop, DirectPickupHotel, Gazetteer, GeoPoint, PickupGuidance};
pub use policies::{
    FleetInfo, LuggagePolicy, SafetyInfo, ServiceOverview, SpecialServices, TravelPolicies,
};
pub use pricing::{FareTable, PassengerLimits, PricingTable, TierInfo};
pub use schedule::{Departure, RouteInfo, Schedules};

#[derive(Debug, Clone, Serialize)]
pub struct FactStore {
    pub service: ServiceOverview,
    pub pricing: PricingTable,
    pub schedules: Schedules,
    pub route: RouteInfo,
    pub locations: Gazetteer,
    pub luggage: LuggagePolicy,
    pub special_services: SpecialServices,
    pub fleet: FleetInfo,
    pub policies: TravelPolicies,
    pub safety: SafetyInfo,
}

impl FactStore {
    /// Build the built-in store and check its invariants.
    pub fn load() -> Result<Self, KnowledgeError> {
        let store = Self {
            service: ServiceOverview::builtin(),
            pricing: PricingTable::builtin(),
            schedules: Schedules::builtin()?,
            route: RouteInfo::builtin(),
            locations: Gazetteer::builtin(),
            luggage: LuggagePolicy::builtin(),
            special_services: SpecialServices::builtin(),
            fleet: FleetInfo::builtin(),
            policies: TravelPolicies::builtin(),
            safety: SafetyInfo::builtin(),
        };
        store.pricing.validate()?;
        store.locations.validate()?;
        for (hotel, stops) in store.locations.ambiguous_hotels() {
            tracing::warn!(
                hotel = %hotel,
                ?stops,
                "[FactStore] Hotel listed at several stops; the first stop wins"
            );
        }

        tracing::debug!(
            stops = store.locations.stops.len(),
            direct_pickup = store.locations.direct_pickup.len(),
            departures = store.schedules.departures().len(),
            "[FactStore] Knowledge base loaded"
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin_store() {
        let store = FactStore::load().unwrap();
        assert_eq!(store.pricing.currency, "ISK");
        assert_eq!(store.locations.direct_pickup.len(), 26);
        assert!(store
            .locations
            .direct_pickup
            .iter()
            .any(|h| h.name == "KEX Hostel"));
    }
}

//! Fare tables for the two Flybus service tiers.

use serde::{Deserialize, Serialize};

use crate::error::KnowledgeError;
use crate::types::{AgeBand, ServiceTier, TripType};

/// Per-passenger prices in ISK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareTable {
    pub adult: u32,
    pub youth: u32,
    pub child: u32,
}

impl FareTable {
    pub fn price(&self, band: AgeBand) -> u32 {
        match band {
            AgeBand::Adult => self.adult,
            AgeBand::Youth => self.youth,
            AgeBand::Child => self.child,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierInfo {
    pub tier: ServiceTier,
    pub name: String,
    /// Names customers use for the tier, normalized.
    pub aliases: Vec<String>,
    pub description: String,
    pub one_way: FareTable,
    pub round_trip: FareTable,
    pub features: Vec<String>,
}

impl TierInfo {
    pub fn fares(&self, trip: TripType) -> &FareTable {
        match trip {
            TripType::OneWay => &self.one_way,
            TripType::Return => &self.round_trip,
        }
    }

    /// Savings of a return ticket over two one-way tickets, per band.
    pub fn return_savings(&self) -> FareTable {
        let saving = |band: AgeBand| {
            (self.one_way.price(band) * 2).saturating_sub(self.round_trip.price(band))
        };
        FareTable {
            adult: saving(AgeBand::Adult),
            youth: saving(AgeBand::Youth),
            child: saving(AgeBand::Child),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerLimits {
    pub youth_per_adult: u32,
    pub children_per_adult: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub currency: String,
    pub standard: TierInfo,
    pub plus: TierInfo,
    pub limits: PassengerLimits,
    pub features: Vec<String>,
    pub youth_age_range: String,
    pub child_age_range: String,
}

impl PricingTable {
    pub fn tier(&self, tier: ServiceTier) -> &TierInfo {
        match tier {
            ServiceTier::Standard => &self.standard,
            ServiceTier::Plus => &self.plus,
        }
    }

    pub(crate) fn builtin() -> Self {
        Self {
            currency: "ISK".into(),
            standard: TierInfo {
                tier: ServiceTier::Standard,
                name: "Flybus".into(),
                aliases: strings(&["flybus", "standard", "regular", "basic"]),
                description: "Direct transfer between Keflavík Airport and BSÍ Bus Terminal"
                    .into(),
                one_way: FareTable {
                    adult: 3999,
                    youth: 2000,
                    child: 0,
                },
                round_trip: FareTable {
                    adult: 7499,
                    youth: 3800,
                    child: 0,
                },
                features: strings(&[
                    "Departs in connection with all arriving flights",
                    "Drop-off at BSÍ Bus Terminal",
                    "Free Wi-Fi on board",
                ]),
            },
            plus: TierInfo {
                tier: ServiceTier::Plus,
                name: "Flybus+".into(),
                aliases: strings(&[
                    "flybus+",
                    "flybus plus",
                    "plus",
                    "hotel pickup",
                    "hotel transfer",
                ]),
                description: "Includes hotel drop-off/pickup service".into(),
                one_way: FareTable {
                    adult: 5199,
                    youth: 2600,
                    child: 0,
                },
                round_trip: FareTable {
                    adult: 9899,
                    youth: 4950,
                    child: 0,
                },
                features: strings(&[
                    "Everything in Flybus",
                    "Transfer between BSÍ and your hotel or nearest bus stop",
                    "Pickup must be booked at least 2 hours before departure",
                ]),
            },
            limits: PassengerLimits {
                youth_per_adult: 40,
                children_per_adult: 2,
            },
            features: strings(&[
                "Free Cancellation (according to cancellation policy)",
                "No Booking Fees",
                "Return tickets available",
            ]),
            youth_age_range: "6-15 years".into(),
            child_age_range: "1-5 years".into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), KnowledgeError> {
        for info in [&self.standard, &self.plus] {
            for fares in [&info.one_way, &info.round_trip] {
                if fares.child != 0 {
                    return Err(KnowledgeError::ChargedChildFare {
                        tier: info.tier.id().to_string(),
                    });
                }
            }
            for band in [AgeBand::Adult, AgeBand::Youth] {
                if info.round_trip.price(band) > info.one_way.price(band) * 2 {
                    return Err(KnowledgeError::ReturnFareTooHigh {
                        tier: info.tier.id().to_string(),
                        band: format!("{:?}", band).to_lowercase(),
                    });
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_pricing_is_valid() {
        let pricing = PricingTable::builtin();
        assert!(pricing.validate().is_ok());
        assert_eq!(pricing.tier(ServiceTier::Plus).one_way.adult, 5199);
    }

    #[test]
    fn test_return_savings() {
        let pricing = PricingTable::builtin();
        let savings = pricing.standard.return_savings();
        assert_eq!(savings.adult, 3999 * 2 - 7499);
        assert_eq!(savings.child, 0);
    }

    #[test]
    fn test_charged_child_fare_rejected() {
        let mut pricing = PricingTable::builtin();
        pricing.plus.round_trip.child = 100;
        assert_eq!(
            pricing.validate(),
            Err(KnowledgeError::ChargedChildFare {
                tier: "plus".into()
            })
        );
    }
}

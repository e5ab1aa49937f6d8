//! Group-composition parsing and group fare calculation.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::knowledge::{PassengerLimits, PricingTable};
use crate::types::{AgeBand, GroupComposition, ServiceTier, TripType};

const NUMBER: &str = r"\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";

static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"\b(?P<n>{NUMBER})\s+(?:(?:small|young|little|teenage|older|grown)\s+)?(?P<cat>adults?|grown ?-?ups?|seniors?|people|persons|passengers|pax|travell?ers|fullord\w*|youths?|teens?|teenagers?|students?|kids?|children|child|infants?|babies|baby|toddlers?|born|barn)\b(?:\s*,?\s*\(?\s*(?:aged?\s+(?P<age1>\d{{1,2}})|(?P<age2>\d{{1,2}})\s*-?\s*(?:years?|yrs?|yo)\b(?:\s*-?\s*old)?))?"
    );
    Regex::new(&pattern).expect("group category regex is valid")
});

static AGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"\b(?:(?P<n>{NUMBER}|a|an)\s+)?(?P<age>\d{{1,2}})\s*-?\s*(?:years?|yrs?|yr)\s*-?\s*olds?\b"
    );
    Regex::new(&pattern).expect("group age regex is valid")
});

fn parse_count(word: &str) -> Option<u32> {
    match word {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        "eleven" => Some(11),
        "twelve" => Some(12),
        digits => digits.parse().ok(),
    }
}

fn category_band(category: &str) -> AgeBand {
    match category {
        c if c.starts_with("youth")
            || c.starts_with("teen")
            || c.starts_with("student") =>
        {
            AgeBand::Youth
        }
        c if c.starts_with("kid")
            || c.starts_with("child")
            || c.starts_with("infant")
            || c.starts_with("bab")
            || c.starts_with("toddler")
            || c == "born"
            || c == "barn" =>
        {
            AgeBand::Child
        }
        _ => AgeBand::Adult,
    }
}

/// Count passengers per fare band in free text.
///
/// Understands `<number> <category>` ("2 adults", "three kids") and explicit
/// ages ("a 3 year old", "1 child aged 10"). A stated age overrides the
/// category word. Returns `None` when the text names no quantities at all,
/// so "no group info" stays distinct from "a group of zero".
pub fn parse_group_composition(normalized: &str) -> Option<GroupComposition> {
    let mut group = GroupComposition::default();
    let mut found = false;
    let mut consumed: Vec<(usize, usize)> = Vec::new();

    for caps in CATEGORY_RE.captures_iter(normalized) {
        let Some(whole) = caps.get(0) else { continue };
        // "2 child seats" is equipment, not passengers.
        if normalized[whole.end()..].trim_start().starts_with("seat") {
            continue;
        }
        let Some(count) = caps.name("n").and_then(|m| parse_count(m.as_str())) else {
            continue;
        };
        let age = caps
            .name("age1")
            .or_else(|| caps.name("age2"))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        let band = match age {
            Some(years) => AgeBand::from_age(years),
            None => category_band(caps.name("cat").map_or("", |m| m.as_str())),
        };
        group.add(band, count);
        consumed.push((whole.start(), whole.end()));
        found = true;
    }

    for caps in AGE_RE.captures_iter(normalized) {
        let Some(whole) = caps.get(0) else { continue };
        if consumed
            .iter()
            .any(|&(start, end)| whole.start() < end && start < whole.end())
        {
            continue;
        }
        let count = caps
            .name("n")
            .and_then(|m| parse_count(m.as_str()))
            .unwrap_or(1);
        let Some(years) = caps.name("age").and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        group.add(AgeBand::from_age(years), count);
        found = true;
    }

    found.then_some(group)
}

/// Does the message state a party size?
pub fn mentions_group_size(normalized: &str) -> bool {
    parse_group_composition(normalized).is_some()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareLine {
    pub band: AgeBand,
    pub count: u32,
    pub unit_price: u32,
    pub subtotal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFare {
    pub tier: ServiceTier,
    pub trip: TripType,
    pub currency: String,
    pub group: GroupComposition,
    pub breakdown: Vec<FareLine>,
    pub total: u32,
    pub limits: PassengerLimits,
    /// Limit violations. Advisory: the booking layer decides whether to block.
    pub warnings: Vec<String>,
}

impl GroupFare {
    pub fn subtotal(&self, band: AgeBand) -> u32 {
        self.breakdown
            .iter()
            .filter(|line| line.band == band)
            .map(|line| line.subtotal)
            .sum()
    }
}

/// Price a party for one tier and trip type, checking the per-adult limits.
pub fn calculate_group_fare(
    pricing: &PricingTable,
    group: &GroupComposition,
    tier: ServiceTier,
    trip: TripType,
) -> GroupFare {
    let fares = pricing.tier(tier).fares(trip);
    let breakdown: Vec<FareLine> = [
        (AgeBand::Adult, group.adults),
        (AgeBand::Youth, group.youths),
        (AgeBand::Child, group.children),
    ]
    .into_iter()
    .map(|(band, count)| {
        let unit_price = match band {
            AgeBand::Child => 0,
            _ => fares.price(band),
        };
        FareLine {
            band,
            count,
            unit_price,
            subtotal: unit_price.saturating_mul(count),
        }
    })
    .collect();
    let total = breakdown.iter().map(|line| line.subtotal).sum();

    let limits = pricing.limits;
    let mut warnings = Vec::new();
    let max_youths = group.adults.saturating_mul(limits.youth_per_adult);
    if group.youths > max_youths {
        warnings.push(format!(
            "{} youths exceed the limit of {} per adult ({} allowed with {} adults)",
            group.youths, limits.youth_per_adult, max_youths, group.adults
        ));
    }
    let max_children = group.adults.saturating_mul(limits.children_per_adult);
    if group.children > max_children {
        warnings.push(format!(
            "{} children exceed the limit of {} per adult ({} allowed with {} adults)",
            group.children, limits.children_per_adult, max_children, group.adults
        ));
    }
    if !warnings.is_empty() {
        tracing::debug!(?group, ?warnings, "[GroupFare] Passenger limits exceeded");
    }

    GroupFare {
        tier,
        trip,
        currency: pricing.currency.clone(),
        group: *group,
        breakdown,
        total,
        limits,
        warnings,
    }
}

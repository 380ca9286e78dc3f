//! One-time registration fees, picked by the length of the requested name.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingTier {
    Standard,
    Premium,
    UltraPremium,
}

impl PricingTier {
    pub const ALL: [PricingTier; 3] = [
        PricingTier::Standard,
        PricingTier::Premium,
        PricingTier::UltraPremium,
    ];

    /// Tier for a domain label, counted in characters. Empty labels have no tier.
    pub fn for_domain(domain: &str) -> Option<Self> {
        match domain.chars().count() {
            0 => None,
            1..=2 => Some(PricingTier::UltraPremium),
            3..=4 => Some(PricingTier::Premium),
            _ => Some(PricingTier::Standard),
        }
    }

    /// Inclusive character-length range; `None` as the upper bound means unbounded.
    pub fn length_range(self) -> (usize, Option<usize>) {
        match self {
            PricingTier::Standard => (5, None),
            PricingTier::Premium => (3, Some(4)),
            PricingTier::UltraPremium => (1, Some(2)),
        }
    }

    pub fn covers(self, length: usize) -> bool {
        match self.length_range() {
            (min, Some(max)) => (min..=max).contains(&length),
            (min, None) => length >= min,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PricingTier::Standard => "Standard",
            PricingTier::Premium => "Premium",
            PricingTier::UltraPremium => "Ultra Premium",
        }
    }

    pub fn tagline(self) -> &'static str {
        match self {
            PricingTier::Standard => "Perfect for personal use",
            PricingTier::Premium => "For businesses and projects",
            PricingTier::UltraPremium => "Short and memorable names",
        }
    }

    /// Price of the one-time fee, in NEAR tokens.
    pub fn price_label(self) -> &'static str {
        match self {
            PricingTier::Standard => "$5",
            PricingTier::Premium => "$10",
            PricingTier::UltraPremium => "$50+",
        }
    }

    pub fn cta_label(self) -> &'static str {
        match self {
            PricingTier::UltraPremium => "Contact Us",
            PricingTier::Standard | PricingTier::Premium => "Register",
        }
    }
}

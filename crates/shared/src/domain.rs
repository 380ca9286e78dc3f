use serde::{Deserialize, Serialize};

use crate::{error::FormError, pricing::PricingTier};

/// The four values a visitor types into the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    pub domain: String,
    pub wallet: String,
    pub email: String,
    pub name: String,
}

impl FormFields {
    pub fn new(
        domain: impl Into<String>,
        wallet: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            wallet: wallet.into(),
            email: email.into(),
            name: name.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Domain => &self.domain,
            Field::Wallet => &self.wallet,
            Field::Email => &self.email,
            Field::Name => &self.name,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Domain => &mut self.domain,
            Field::Wallet => &mut self.wallet,
            Field::Email => &mut self.email,
            Field::Name => &mut self.name,
        };
        *slot = value.into();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Domain,
    Wallet,
    Email,
    Name,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Domain, Field::Wallet, Field::Email, Field::Name];
}

/// Lifecycle of one registration attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error(FormError),
}

impl SubmissionStatus {
    pub fn error_message(&self) -> Option<String> {
        match self {
            SubmissionStatus::Error(err) => Some(err.to_string()),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SubmissionStatus::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionStatus::Submitting)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Submitting => "submitting",
            SubmissionStatus::Success => "success",
            SubmissionStatus::Error(_) => "error",
        }
    }
}

/// Page section that asked for the registration form to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "section", content = "tier", rename_all = "snake_case")]
pub enum CallSite {
    Hero,
    Pricing(PricingTier),
    Faq,
    RegisterSection,
}

impl CallSite {
    pub fn name(self) -> &'static str {
        match self {
            CallSite::Hero => "hero",
            CallSite::Pricing(_) => "pricing",
            CallSite::Faq => "faq",
            CallSite::RegisterSection => "register",
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{domain::FormFields, pricing::PricingTier};

pub const NEAR_SUFFIX: &str = ".near";

/// What a registrar receives for one submission: the field values frozen at the
/// moment the visitor pressed submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub request_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub domain: String,
    pub wallet: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<PricingTier>,
}

impl RegistrationRequest {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            requested_at: Utc::now(),
            domain: fields.domain.clone(),
            wallet: fields.wallet.clone(),
            email: fields.email.clone(),
            name: fields.name.clone(),
            tier: PricingTier::for_domain(&fields.domain),
        }
    }

    pub fn full_domain(&self) -> String {
        format!("{}{NEAR_SUFFIX}", self.domain)
    }

    pub fn fields(&self) -> FormFields {
        FormFields::new(
            self.domain.clone(),
            self.wallet.clone(),
            self.email.clone(),
            self.name.clone(),
        )
    }
}

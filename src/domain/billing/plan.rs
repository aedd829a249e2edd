//! Plan tiers and the static price-to-plan table.
//!
//! The table is the only place a processor price id is interpreted. Lookups
//! are total: a price the table does not know maps to the table's default
//! tier, so plan classification can never block a status update.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Internal subscription level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// No paid subscription. Also the forced tier after cancellation.
    Free,
    /// Entry paid tier, and the default for unmapped prices.
    Standard,
    /// Top paid tier.
    Premium,
}

impl PlanTier {
    /// Returns the storage representation of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Standard => "standard",
            PlanTier::Premium => "premium",
        }
    }
}

impl Default for PlanTier {
    fn default() -> Self {
        PlanTier::Standard
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "standard" => Ok(PlanTier::Standard),
            "premium" => Ok(PlanTier::Premium),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown plan tier '{}'", other),
            )),
        }
    }
}

/// Static mapping from processor price ids to plan tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceToPlanTable {
    entries: HashMap<String, PlanTier>,
    default_plan: PlanTier,
}

impl PriceToPlanTable {
    /// Creates a table from `(price_id, tier)` pairs with the `standard` default.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, PlanTier)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(price, plan)| (price.into(), plan))
                .collect(),
            default_plan: PlanTier::Standard,
        }
    }

    /// Overrides the tier returned for unmapped prices.
    pub fn with_default(mut self, default_plan: PlanTier) -> Self {
        self.default_plan = default_plan;
        self
    }

    /// Parses the configuration form of the table.
    ///
    /// Format: `price_id:tier[,price_id:tier...]`. Whitespace around entries is
    /// ignored and an empty string yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidFormat` for entries without a `:`, with an
    /// empty price id, or with an unknown tier name.
    pub fn parse(pairs: &str) -> Result<Self, ValidationError> {
        let mut entries = HashMap::new();

        for entry in pairs.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (price, plan) = entry.split_once(':').ok_or_else(|| {
                ValidationError::invalid_format(
                    "price_plans",
                    format!("entry '{}' is not price_id:tier", entry),
                )
            })?;

            let price = price.trim();
            if price.is_empty() {
                return Err(ValidationError::invalid_format(
                    "price_plans",
                    format!("entry '{}' has an empty price id", entry),
                ));
            }

            entries.insert(price.to_string(), plan.parse()?);
        }

        Ok(Self {
            entries,
            default_plan: PlanTier::Standard,
        })
    }

    /// Maps a price id to its plan tier. Never fails.
    ///
    /// A missing price id (for example when the subscription could not be
    /// fetched) is treated like an unknown one.
    pub fn plan_for(&self, price_id: Option<&str>) -> PlanTier {
        price_id
            .and_then(|id| self.entries.get(id))
            .copied()
            .unwrap_or(self.default_plan)
    }

    /// Returns the tier used for unmapped prices.
    pub fn default_plan(&self) -> PlanTier {
        self.default_plan
    }

    /// Number of explicitly mapped prices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no price is mapped explicitly.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PriceToPlanTable {
    fn default() -> Self {
        Self::new(Vec::<(String, PlanTier)>::new())
    }
}

//! Subscription plans offered to POS customers.

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Starter,
    Professional,
    Enterprise,
}

/// How often a plan is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// Suffix shown after a price, e.g. "/mo".
    #[must_use]
    pub const fn period_label(&self) -> &'static str {
        match self {
            Self::Monthly => "/mo",
            Self::Yearly => "/yr",
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("invalid billing cycle: {s}")),
        }
    }
}

/// A subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionPlan {
    pub tier: PlanTier,
    pub name: &'static str,
    pub description: &'static str,
    pub monthly_price: Price,
    pub yearly_price: Price,
    pub features: &'static [&'static str],
    /// Shown as the recommended plan.
    pub highlighted: bool,
}

impl SubscriptionPlan {
    /// Price for one billing period.
    #[must_use]
    pub const fn price(&self, cycle: BillingCycle) -> Price {
        match cycle {
            BillingCycle::Monthly => self.monthly_price,
            BillingCycle::Yearly => self.yearly_price,
        }
    }

    /// Amount saved per year by paying yearly instead of monthly.
    #[must_use]
    pub fn yearly_savings(&self) -> Price {
        let twelve_months = self.monthly_price.times(12).amount();
        Price::new(twelve_months - self.yearly_price.amount()).unwrap_or(Price::ZERO)
    }
}

/// Every plan, cheapest first.
#[must_use]
pub fn plans() -> [SubscriptionPlan; 3] {
    [
        SubscriptionPlan {
            tier: PlanTier::Starter,
            name: "Starter",
            description: "For a single register getting started",
            monthly_price: Price::from_cents(2900),
            yearly_price: Price::from_cents(29_000),
            features: &[
                "1 register",
                "Product catalog",
                "Sales reports",
                "Email support",
            ],
            highlighted: false,
        },
        SubscriptionPlan {
            tier: PlanTier::Professional,
            name: "Professional",
            description: "For growing stores with a team",
            monthly_price: Price::from_cents(7900),
            yearly_price: Price::from_cents(79_000),
            features: &[
                "Up to 5 registers",
                "Inventory tracking",
                "Staff accounts",
                "Custom receipts",
                "Priority support",
            ],
            highlighted: true,
        },
        SubscriptionPlan {
            tier: PlanTier::Enterprise,
            name: "Enterprise",
            description: "For multi-location businesses",
            monthly_price: Price::from_cents(19_900),
            yearly_price: Price::from_cents(199_000),
            features: &[
                "Unlimited registers",
                "Multi-location management",
                "Advanced analytics",
                "API access",
                "Dedicated account manager",
            ],
            highlighted: false,
        },
    ]
}

//! Pure derivation helpers shared by every renderer.
//!
//! Cost-base totals, ownership-day math, and currency formatting live
//! here so table views, reports, and summaries cannot diverge. All
//! functions are deterministic and side-effect free.

pub mod cost_base;
pub mod currency;
pub mod ownership;

pub use cost_base::{
    capital_gain, division43_deductions, event_cost_bases_total, improvement_amount,
    improvement_costs, purchase_incidental_costs, purchase_price, sale_price, selling_costs,
    total_cost_base,
};
pub use currency::{format_currency, parse_numeric_string};
pub use ownership::{days_between, exempt_percentage, parse_date_flexible, period_days};

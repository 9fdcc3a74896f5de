//! Cost-base and capital-gain calculations over timeline events.
//!
//! Upstream data may record a transaction price either as a scalar
//! `amount` or itemized in the event's cost bases; every helper supports
//! both without double-counting. The shared exclusion list keeps the
//! main price lines out of every incidental-cost sum; a call site
//! filtering with its own list would count the transaction amount
//! alongside its breakdown.

use crate::domain::TimelineEvent;

/// Main price line items, excluded from every incidental-cost sum.
/// These are the acquisition/disposal amounts tracked separately, not
/// additional costs.
const EXCLUDE_FROM_COST_SUMS: [&str; 4] = [
    "purchase_price",
    "land_price",
    "building_price",
    "sale_price",
];

fn is_main_price_item(definition_id: &str) -> bool {
    EXCLUDE_FROM_COST_SUMS.contains(&definition_id)
}

/// Sum an event's cost bases, skipping the main price items
fn sum_excluding_price_items(event: &TimelineEvent) -> f64 {
    event
        .cost_bases
        .iter()
        .filter(|cb| !is_main_price_item(&cb.definition_id))
        .map(|cb| cb.amount)
        .sum()
}

/// Find a cost-base line by definition id, returning its amount if positive
fn positive_line_amount(event: &TimelineEvent, definition_id: &str) -> Option<f64> {
    event
        .cost_bases
        .iter()
        .find(|cb| cb.definition_id == definition_id)
        .map(|cb| cb.amount)
        .filter(|amount| *amount > 0.0)
}

/// Purchase price for an event.
///
/// Checks `event.amount` first, then falls back to the `purchase_price`
/// line, then `land_price` + `building_price`.
pub fn purchase_price(purchase_event: Option<&TimelineEvent>) -> f64 {
    let Some(event) = purchase_event else {
        return 0.0;
    };

    if let Some(amount) = event.amount.filter(|a| *a > 0.0) {
        return amount;
    }

    if let Some(amount) = positive_line_amount(event, "purchase_price") {
        return amount;
    }

    let land = positive_line_amount(event, "land_price").unwrap_or(0.0);
    let building = positive_line_amount(event, "building_price").unwrap_or(0.0);
    if land > 0.0 || building > 0.0 {
        return land + building;
    }

    0.0
}

/// Sale price for an event.
///
/// Checks `event.amount` first, then the `sale_price` line.
pub fn sale_price(sale_event: Option<&TimelineEvent>) -> f64 {
    let Some(event) = sale_event else {
        return 0.0;
    };

    if let Some(amount) = event.amount.filter(|a| *a > 0.0) {
        return amount;
    }

    positive_line_amount(event, "sale_price").unwrap_or(0.0)
}

/// Incidental acquisition costs: all purchase cost bases except the
/// acquisition amount itself.
pub fn purchase_incidental_costs(purchase_event: Option<&TimelineEvent>) -> f64 {
    purchase_event.map(sum_excluding_price_items).unwrap_or(0.0)
}

/// Improvement cost for a single event: `amount` if set, otherwise the
/// sum of its non-price cost bases.
pub fn improvement_amount(improvement_event: Option<&TimelineEvent>) -> f64 {
    let Some(event) = improvement_event else {
        return 0.0;
    };

    if let Some(amount) = event.amount.filter(|a| *a > 0.0) {
        return amount;
    }

    sum_excluding_price_items(event)
}

/// Total improvement costs across all improvement events
pub fn improvement_costs(improvement_events: &[TimelineEvent]) -> f64 {
    improvement_events
        .iter()
        .map(|e| improvement_amount(Some(e)))
        .sum()
}

/// Selling/disposal costs: all sale cost bases except the proceeds
pub fn selling_costs(sale_event: Option<&TimelineEvent>) -> f64 {
    sale_event.map(sum_excluding_price_items).unwrap_or(0.0)
}

/// Display total of an event's cost bases, including the price items.
/// For showing the full breakdown only; never use in the CGT sum.
pub fn event_cost_bases_total(event: Option<&TimelineEvent>) -> f64 {
    event
        .map(|e| e.cost_bases.iter().map(|cb| cb.amount).sum())
        .unwrap_or(0.0)
}

/// Division 43 (capital works) deductions claimed against a sale.
/// These reduce the cost base; Division 40 deductions do not.
pub fn division43_deductions(sale_event: Option<&TimelineEvent>) -> f64 {
    sale_event
        .and_then(|e| e.division43_deductions)
        .unwrap_or(0.0)
}

/// Complete cost base for the CGT calculation
pub fn total_cost_base(
    purchase_event: Option<&TimelineEvent>,
    improvement_events: &[TimelineEvent],
    sale_event: Option<&TimelineEvent>,
) -> f64 {
    purchase_price(purchase_event)
        + purchase_incidental_costs(purchase_event)
        + improvement_costs(improvement_events)
        + selling_costs(sale_event)
        - division43_deductions(sale_event)
}

/// Capital gain or loss: sale proceeds less the total cost base.
/// Returns 0 while the property is still held (no sale event).
pub fn capital_gain(
    purchase_event: Option<&TimelineEvent>,
    improvement_events: &[TimelineEvent],
    sale_event: Option<&TimelineEvent>,
) -> f64 {
    if sale_event.is_none() {
        return 0.0;
    }

    sale_price(sale_event) - total_cost_base(purchase_event, improvement_events, sale_event)
}

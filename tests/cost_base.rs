//! Cost-Base Calculation Integration Tests
//!
//! End-to-end checks of the capital-gain math over realistic timelines,
//! including the no-double-counting and exclusion-list guarantees.

use cgtbrain::calc::{
    capital_gain, event_cost_bases_total, purchase_incidental_costs, purchase_price, sale_price,
    selling_costs, total_cost_base,
};
use cgtbrain::domain::{EventKind, TimelineEvent};

fn typical_purchase() -> TimelineEvent {
    TimelineEvent::new(EventKind::Purchase)
        .with_cost_base("purchase_price", 500_000.0)
        .with_cost_base("stamp_duty", 20_000.0)
        .with_cost_base("conveyancing_fees", 1_500.0)
        .with_cost_base("building_inspection", 500.0)
}

fn typical_sale() -> TimelineEvent {
    TimelineEvent::new(EventKind::Sale)
        .with_cost_base("sale_price", 800_000.0)
        .with_cost_base("agent_fees", 16_000.0)
        .with_cost_base("legal_fees", 2_000.0)
}

#[test]
fn test_amount_and_line_item_never_double_count() {
    // Upstream sometimes records the price as a scalar AND as an
    // itemized line; the price must be counted exactly once
    let purchase = TimelineEvent::new(EventKind::Purchase)
        .with_amount(500_000.0)
        .with_cost_base("purchase_price", 500_000.0)
        .with_cost_base("stamp_duty", 20_000.0);

    assert_eq!(purchase_price(Some(&purchase)), 500_000.0);
    assert_eq!(purchase_incidental_costs(Some(&purchase)), 20_000.0);
    assert_eq!(
        total_cost_base(Some(&purchase), &[], None),
        520_000.0,
        "price must not be counted from both the scalar and the line item"
    );

    let sale = TimelineEvent::new(EventKind::Sale)
        .with_amount(800_000.0)
        .with_cost_base("sale_price", 800_000.0)
        .with_cost_base("agent_fees", 16_000.0);

    assert_eq!(sale_price(Some(&sale)), 800_000.0);
    assert_eq!(selling_costs(Some(&sale)), 16_000.0);
}

#[test]
fn test_exclusion_list_is_consistent_across_helpers() {
    // Every main price line is excluded from every incidental sum
    let event = TimelineEvent::new(EventKind::Purchase)
        .with_cost_base("purchase_price", 100_000.0)
        .with_cost_base("land_price", 300_000.0)
        .with_cost_base("building_price", 250_000.0)
        .with_cost_base("sale_price", 999_999.0)
        .with_cost_base("stamp_duty", 20_000.0);

    assert_eq!(purchase_incidental_costs(Some(&event)), 20_000.0);
    assert_eq!(selling_costs(Some(&event)), 20_000.0);

    // The display total, by contrast, includes everything
    assert_eq!(event_cost_bases_total(Some(&event)), 1_669_999.0);
}

#[test]
fn test_capital_gain_zero_without_sale() {
    let purchase = typical_purchase();
    let improvements =
        vec![TimelineEvent::new(EventKind::Improvement).with_amount(40_000.0)];

    assert_eq!(capital_gain(Some(&purchase), &improvements, None), 0.0);
    assert_eq!(capital_gain(None, &[], None), 0.0);
}

#[test]
fn test_full_timeline_capital_gain() {
    let purchase = typical_purchase();
    let improvements = vec![
        TimelineEvent::new(EventKind::Improvement).with_amount(40_000.0),
        TimelineEvent::new(EventKind::Improvement)
            .with_cost_base("kitchen_renovation", 35_000.0),
    ];
    let mut sale = typical_sale();
    sale.division43_deductions = Some(5_000.0);

    // purchase 500000 + incidentals 22000 + improvements 75000
    //   + selling 18000 - div43 5000 = 610000
    let cost_base = total_cost_base(Some(&purchase), &improvements, Some(&sale));
    assert_eq!(cost_base, 610_000.0);

    let gain = capital_gain(Some(&purchase), &improvements, Some(&sale));
    assert_eq!(gain, 190_000.0);
}

#[test]
fn test_capital_loss_is_negative() {
    let purchase = TimelineEvent::new(EventKind::Purchase).with_amount(900_000.0);
    let sale = TimelineEvent::new(EventKind::Sale).with_amount(800_000.0);

    let gain = capital_gain(Some(&purchase), &[], Some(&sale));
    assert_eq!(gain, -100_000.0);
}

#[test]
fn test_land_and_building_split_purchase() {
    let purchase = TimelineEvent::new(EventKind::Purchase)
        .with_cost_base("land_price", 300_000.0)
        .with_cost_base("building_price", 250_000.0)
        .with_cost_base("stamp_duty", 22_000.0);

    assert_eq!(purchase_price(Some(&purchase)), 550_000.0);
    assert_eq!(purchase_incidental_costs(Some(&purchase)), 22_000.0);
}

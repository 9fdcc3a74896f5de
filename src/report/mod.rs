//! Markdown report rendering.
//!
//! Renders a [`NormalizedResponse`] into a multi-section markdown report:
//! summary, per-property analysis, citations. Missing optional fields
//! omit their section; an empty report body is valid output, never an
//! error. Unrecognized payloads render as raw JSON under an explanatory
//! banner.

use std::fmt::Write;

use crate::calc::{
    capital_gain, division43_deductions, format_currency, improvement_costs, period_days,
    purchase_incidental_costs, purchase_price, sale_price, selling_costs, total_cost_base,
};
use crate::domain::{Citations, EventKind, GapQuestion, PropertyAnalysis, TimelineEvent};
use crate::normalize::{DisplayMode, NormalizedResponse, ResponseShape};

/// Render a normalized response as a markdown report
pub fn render(response: &NormalizedResponse) -> String {
    if response.is_missing() {
        return "No analysis data available.\n".to_string();
    }

    if response.needs_clarification() {
        return render_clarification(response);
    }

    match response.mode {
        DisplayMode::JsonSections => render_sections(response),
        DisplayMode::Markdown => render_markdown(response),
    }
}

fn render_sections(response: &NormalizedResponse) -> String {
    let mut out = String::new();

    writeln!(out, "# CGT Analysis Report").ok();
    writeln!(out).ok();

    if let Some(analysis) = &response.analysis {
        if let Some(date) = &analysis.analysis_date {
            writeln!(out, "*Analysis date: {}*", date).ok();
            writeln!(out).ok();
        }

        if let Some(description) = &analysis.description {
            writeln!(out, "{}", description).ok();
            writeln!(out).ok();
        }

        let total = analysis
            .total_properties
            .map(|t| t as usize)
            .unwrap_or(analysis.properties.len());
        writeln!(out, "Properties analyzed: {}", total).ok();
        writeln!(out).ok();

        for property in &analysis.properties {
            render_property(&mut out, property);
        }

        if let Some(notes) = &analysis.general_notes {
            writeln!(out, "## General notes").ok();
            writeln!(out).ok();
            writeln!(out, "{}", notes).ok();
            writeln!(out).ok();
        }
    } else {
        // Legacy success payloads may carry no extractable property list
        writeln!(out, "_No structured property data in this response._").ok();
        writeln!(out).ok();
    }

    render_citations(&mut out, response.citations.as_ref());
    render_follow_up_hint(&mut out, response);

    out
}

fn render_property(out: &mut String, property: &PropertyAnalysis) {
    let address = property
        .property_address
        .as_deref()
        .unwrap_or("(address not provided)");
    writeln!(out, "## {}", address).ok();
    writeln!(out).ok();

    if let Some(status) = &property.verification_status {
        writeln!(out, "Verification: {}", status).ok();
        writeln!(out).ok();
    }

    if let Some(purchase) = &property.purchase {
        if let Some(amount) = purchase.amount {
            let date = purchase.date.as_deref().unwrap_or("unknown date");
            writeln!(out, "- Purchased {} for {}", date, format_currency(amount)).ok();
        }
    }
    if let Some(sale) = &property.sale {
        if let Some(amount) = sale.amount {
            let date = sale.date.as_deref().unwrap_or("unknown date");
            writeln!(out, "- Sold {} for {}", date, format_currency(amount)).ok();
        }
    }
    if property.purchase.is_some() || property.sale.is_some() {
        writeln!(out).ok();
    }

    if !property.ownership_periods.is_empty() {
        writeln!(out, "### Ownership periods").ok();
        writeln!(out).ok();
        writeln!(out, "| Usage | From | To | Days | Exempt |").ok();
        writeln!(out, "|---|---|---|---|---|").ok();
        for period in &property.ownership_periods {
            let usage = period.period_type.as_deref().unwrap_or("-");
            let from = period.start.as_deref().unwrap_or("-");
            let to = period.end.as_deref().unwrap_or("-");
            let days = period_days(period)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let exempt = period
                .exemption_percentage
                .map(|p| format!("{:.0}%", p))
                .unwrap_or_else(|| "-".to_string());
            writeln!(out, "| {} | {} | {} | {} | {} |", usage, from, to, days, exempt).ok();
        }
        writeln!(out).ok();
    }

    if !property.cost_base_items.is_empty() {
        writeln!(out, "### Cost base").ok();
        writeln!(out).ok();
        let mut total = 0.0;
        for item in &property.cost_base_items {
            let label = item
                .label
                .as_deref()
                .or(item.definition_id.as_deref())
                .unwrap_or("item");
            let amount = item.amount.unwrap_or(0.0);
            total += amount;
            writeln!(out, "- {}: {}", label, format_currency(amount)).ok();
        }
        writeln!(out, "- **Total: {}**", format_currency(total)).ok();
        writeln!(out).ok();
    }

    if !property.calculation_steps.is_empty() {
        writeln!(out, "### Calculation").ok();
        writeln!(out).ok();
        for (i, step) in property.calculation_steps.iter().enumerate() {
            let label = step.label.as_deref().unwrap_or("Step");
            match step.amount {
                Some(amount) => {
                    writeln!(out, "{}. {}: {}", i + 1, label, format_currency(amount)).ok()
                }
                None => writeln!(out, "{}. {}", i + 1, label).ok(),
            };
            if let Some(formula) = &step.formula {
                writeln!(out, "   `{}`", formula).ok();
            }
        }
        writeln!(out).ok();
    }

    if !property.applicable_rules.is_empty() {
        writeln!(out, "### Applicable rules").ok();
        writeln!(out).ok();
        for rule in &property.applicable_rules {
            let name = rule.rule.as_deref().unwrap_or("Rule");
            match &rule.reference {
                Some(reference) => writeln!(out, "- {} ({})", name, reference).ok(),
                None => writeln!(out, "- {}", name).ok(),
            };
            if let Some(impact) = &rule.impact {
                writeln!(out, "  {}", impact).ok();
            }
        }
        writeln!(out).ok();
    }

    if !property.what_if_scenarios.is_empty() {
        writeln!(out, "### What-if scenarios").ok();
        writeln!(out).ok();
        for scenario in &property.what_if_scenarios {
            let name = scenario.scenario.as_deref().unwrap_or("Scenario");
            match scenario.estimated_gain {
                Some(gain) => {
                    writeln!(out, "- {}: estimated gain {}", name, format_currency(gain)).ok()
                }
                None => writeln!(out, "- {}", name).ok(),
            };
        }
        writeln!(out).ok();
    }

    if !property.warnings.is_empty() {
        writeln!(out, "### Warnings").ok();
        writeln!(out).ok();
        for warning in &property.warnings {
            writeln!(out, "- {}", warning).ok();
        }
        writeln!(out).ok();
    }

    if !property.notes.is_empty() {
        writeln!(out, "### Notes").ok();
        writeln!(out).ok();
        for note in &property.notes {
            writeln!(out, "- {}", note).ok();
        }
        writeln!(out).ok();
    }
}

fn render_markdown(response: &NormalizedResponse) -> String {
    let mut out = String::new();

    match (&response.markdown, response.shape) {
        (Some(body), _) => {
            writeln!(out, "{}", body).ok();
            writeln!(out).ok();
        }
        (None, ResponseShape::Unknown) => {
            writeln!(out, "# Unrecognized response format").ok();
            writeln!(out).ok();
            writeln!(
                out,
                "The response below did not match any known format and is shown as received."
            )
            .ok();
            writeln!(out).ok();
            writeln!(out, "```json").ok();
            writeln!(
                out,
                "{}",
                serde_json::to_string_pretty(&response.raw).unwrap_or_default()
            )
            .ok();
            writeln!(out, "```").ok();
        }
        (None, _) => {
            // Markdown shape with empty content still renders
        }
    }

    render_citations(&mut out, response.citations.as_ref());
    render_follow_up_hint(&mut out, response);

    out
}

fn render_clarification(response: &NormalizedResponse) -> String {
    let mut out = String::new();

    writeln!(out, "# Analysis blocked - information required").ok();
    writeln!(out).ok();
    writeln!(
        out,
        "Clarification about timeline gaps is needed before CGT can be calculated."
    )
    .ok();
    writeln!(out).ok();

    if let Some(portfolio) = &response.portfolio {
        writeln!(out, "## Portfolio summary").ok();
        writeln!(out).ok();
        writeln!(out, "- Total properties: {}", portfolio.total_properties).ok();
        writeln!(out, "- Passed: {}", portfolio.properties_passed).ok();
        writeln!(out, "- Need clarification: {}", portfolio.properties_failed).ok();
        writeln!(out).ok();
    }

    if !response.gap_questions.is_empty() {
        writeln!(out, "## Clarification questions").ok();
        writeln!(out).ok();
        for (i, question) in response.gap_questions.iter().enumerate() {
            render_gap_question(&mut out, i + 1, question);
        }
    }

    if let Some(analysis) = &response.analysis {
        let with_status: Vec<_> = analysis
            .properties
            .iter()
            .filter(|p| p.verification_status.is_some())
            .collect();
        if !with_status.is_empty() {
            writeln!(out, "## Property status").ok();
            writeln!(out).ok();
            for property in with_status {
                let address = property
                    .property_address
                    .as_deref()
                    .unwrap_or("(address not provided)");
                let status = property.verification_status.as_deref().unwrap_or("-");
                match &property.quick_summary {
                    Some(summary) => {
                        writeln!(out, "- {} [{}]: {}", address, status, summary).ok()
                    }
                    None => writeln!(out, "- {} [{}]", address, status).ok(),
                };
            }
            writeln!(out).ok();
        }
    }

    out
}

fn render_gap_question(out: &mut String, number: usize, question: &GapQuestion) {
    writeln!(out, "{}. {}", number, question.question).ok();

    if !question.period.start.is_empty() {
        writeln!(
            out,
            "   Period: {} to {} ({} days)",
            question.period.start, question.period.end, question.period.days
        )
        .ok();
    }

    if !question.properties_involved.is_empty() {
        writeln!(
            out,
            "   Properties: {}",
            question.properties_involved.join(", ")
        )
        .ok();
    }

    for answer in &question.possible_answers {
        writeln!(out, "   - [ ] {}", answer).ok();
    }

    writeln!(out).ok();
}

fn render_citations(out: &mut String, citations: Option<&Citations>) {
    let Some(citations) = citations else {
        return;
    };

    if citations.references.is_empty() && citations.rules_summary.is_none() {
        return;
    }

    writeln!(out, "## Sources").ok();
    writeln!(out).ok();

    if let Some(summary) = &citations.rules_summary {
        writeln!(out, "{}", summary).ok();
        writeln!(out).ok();
    }

    for reference in &citations.references {
        let title = reference.title.as_deref().unwrap_or("Untitled source");
        let mut line = format!("- {}", title);
        if let Some(document) = &reference.source_document {
            line.push_str(&format!(", {}", document));
        }
        if let Some(page) = &reference.page {
            line.push_str(&format!(", p. {}", page));
        }
        if let Some(url) = &reference.url {
            line.push_str(&format!(" <{}>", url));
        }
        writeln!(out, "{}", line).ok();
    }
    writeln!(out).ok();
}

/// Render a cost-base breakdown derived from raw timeline events.
///
/// Appended to a report when the caller supplies the timeline the
/// analysis was run against; computed locally, independent of what the
/// upstream response says.
pub fn render_timeline_costs(events: &[TimelineEvent]) -> String {
    let purchase = events.iter().find(|e| e.kind == EventKind::Purchase);
    let sale = events.iter().find(|e| e.kind == EventKind::Sale);
    let improvements: Vec<TimelineEvent> = events
        .iter()
        .filter(|e| e.kind == EventKind::Improvement)
        .cloned()
        .collect();

    let mut out = String::new();
    writeln!(out, "## Cost base (from timeline)").ok();
    writeln!(out).ok();
    writeln!(out, "- Purchase price: {}", format_currency(purchase_price(purchase))).ok();
    writeln!(
        out,
        "- Purchase incidentals: {}",
        format_currency(purchase_incidental_costs(purchase))
    )
    .ok();
    writeln!(
        out,
        "- Improvements: {}",
        format_currency(improvement_costs(&improvements))
    )
    .ok();
    writeln!(out, "- Selling costs: {}", format_currency(selling_costs(sale))).ok();

    let deductions = division43_deductions(sale);
    if deductions > 0.0 {
        writeln!(out, "- Division 43 deductions: -{}", format_currency(deductions)).ok();
    }

    writeln!(
        out,
        "- **Total cost base: {}**",
        format_currency(total_cost_base(purchase, &improvements, sale))
    )
    .ok();

    if sale.is_some() {
        writeln!(
            out,
            "- **Capital gain: {}**",
            format_currency(capital_gain(purchase, &improvements, sale))
        )
        .ok();
    } else {
        writeln!(out, "- Capital gain: not yet sold").ok();
    }
    writeln!(out).ok();

    out
}

fn render_follow_up_hint(out: &mut String, response: &NormalizedResponse) {
    if response.session.follow_up_available() {
        writeln!(
            out,
            "_Follow-up questions available for this analysis (provider: {})._",
            response.session.llm_provider
        )
        .ok();
    }
}

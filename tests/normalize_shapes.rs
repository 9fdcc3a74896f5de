//! Shape Detection and Extraction Integration Tests
//!
//! Exercises the full normalization path across every structural variant
//! the upstream API has been seen to return.

use cgtbrain::normalize::{detect, is_displayable, normalize, DisplayMode, ResponseShape};
use cgtbrain::LlmProvider;
use serde_json::json;

fn property() -> serde_json::Value {
    json!({
        "property_address": "1 Smith St",
        "purchase": {"date": "2015-03-01", "amount": 500000.0},
        "sale": {"date": "2023-06-15", "amount": 800000.0}
    })
}

#[test]
fn test_identical_properties_across_json_shapes() {
    // The same logical analysis delivered in each JSON variant must
    // extract the same property list
    let double_wrapped = json!({
        "success": true,
        "data": { "success": true, "data": { "properties": [property()] } }
    });
    let wrapped = json!({
        "success": true,
        "data": { "properties": [property()] }
    });
    let direct = json!({ "properties": [property()] });
    let legacy_success = json!({
        "status": "success",
        "properties": [{
            "address": "1 Smith St",
            "purchase": {"date": "2015-03-01", "amount": 500000.0},
            "sale": {"date": "2023-06-15", "amount": 800000.0}
        }]
    });

    let expected_shapes = [
        (&double_wrapped, ResponseShape::DoubleWrappedJson),
        (&wrapped, ResponseShape::WrappedJson),
        (&direct, ResponseShape::DirectJson),
        (&legacy_success, ResponseShape::LegacySuccess),
    ];

    for (response, expected) in expected_shapes {
        let normalized = normalize(response);
        assert_eq!(normalized.shape, expected);
        assert_eq!(normalized.mode, DisplayMode::JsonSections);

        let analysis = normalized.analysis.expect("analysis extracted");
        assert_eq!(analysis.properties.len(), 1);
        assert_eq!(
            analysis.properties[0].property_address.as_deref(),
            Some("1 Smith St"),
            "address mismatch for {:?}",
            expected
        );
        assert_eq!(
            analysis.properties[0].purchase.as_ref().unwrap().amount,
            Some(500000.0)
        );
    }
}

#[test]
fn test_verification_failed_outranks_every_display_shape() {
    // A payload that satisfies a JSON predicate AND signals clarification
    // must classify as verification-failed
    let looks_wrapped = json!({
        "success": true,
        "status": "verification_failed",
        "data": { "properties": [property()] }
    });
    assert_eq!(detect(&looks_wrapped), ResponseShape::VerificationFailed);

    let looks_markdown = json!({
        "answer": "## Partial analysis",
        "needs_clarification": true,
        "clarification_questions": [{"question": "Where did you live?"}]
    });
    assert_eq!(detect(&looks_markdown), ResponseShape::VerificationFailed);
}

#[test]
fn test_double_wrapped_worked_example() {
    let response = json!({
        "success": true,
        "session_id": "abc",
        "data": {
            "success": true,
            "data": {
                "properties": [property()],
                "llm_used": "DeepSeek Chat (DeepSeek)"
            },
            "sources": { "references": [{"title": "ITAA 1997 s104-10"}] }
        }
    });

    let normalized = normalize(&response);
    assert_eq!(normalized.shape, ResponseShape::DoubleWrappedJson);
    assert_eq!(normalized.session.session_id.as_deref(), Some("abc"));
    assert!(normalized.session.follow_up_available());
    assert_eq!(normalized.session.llm_provider, LlmProvider::Deepseek);

    let citations = normalized.citations.expect("citations found via data.sources");
    assert_eq!(
        citations.references[0].title.as_deref(),
        Some("ITAA 1997 s104-10")
    );
}

#[test]
fn test_clarification_worked_example() {
    let response = json!({
        "needs_clarification": true,
        "clarification_questions": [{
            "question": "What was 1 Smith St used for between these dates?",
            "type": "usage_gap",
            "period": {"start": "2020-01-01", "end": "2020-06-01", "days": 152},
            "properties_involved": ["1 Smith St"],
            "possible_answers": ["Rented out", "Vacant", "Main residence"]
        }],
        "summary": {"total_properties": 1, "properties_passed": 0, "properties_failed": 1}
    });

    let normalized = normalize(&response);
    assert!(normalized.needs_clarification());
    assert_eq!(normalized.gap_questions.len(), 1);

    let question = &normalized.gap_questions[0];
    assert_eq!(question.period.days, 152);
    assert_eq!(question.possible_answers.len(), 3);

    let portfolio = normalized.portfolio.expect("summary extracted");
    assert_eq!(portfolio.properties_failed, 1);
}

#[test]
fn test_unrecognized_payload_is_displayable_fallback() {
    // Unknown shapes are not errors: the payload is preserved for raw
    // display and the mode falls back to markdown
    let response = json!({"totally": {"unexpected": ["layout"]}});

    assert!(!is_displayable(&response));

    let normalized = normalize(&response);
    assert_eq!(normalized.shape, ResponseShape::Unknown);
    assert_eq!(normalized.mode, DisplayMode::Markdown);
    assert_eq!(normalized.raw, response);
    assert!(normalized.analysis.is_none());
}

#[test]
fn test_provider_canonicalization_is_idempotent() {
    let names = [
        "DeepSeek Chat (DeepSeek)",
        "Claude 3.5 Sonnet (Anthropic)",
        "GPT-4o (OpenAI)",
        "OLMo 2 (via OpenRouter)",
    ];

    for name in names {
        let provider = LlmProvider::from_display_name(name);
        // Re-canonicalizing the canonical key must be a fixed point
        assert_eq!(LlmProvider::from_display_name(provider.as_key()), provider);
    }

    assert_eq!(
        LlmProvider::from_display_name("something unheard of"),
        LlmProvider::Deepseek
    );
}

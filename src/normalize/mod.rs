//! Response normalization: shape detection and canonical extraction.
//!
//! The upstream analysis API returns one of several structural variants.
//! This module classifies a raw `serde_json::Value` into exactly one
//! [`ResponseShape`], projects it into a [`NormalizedResponse`], and
//! selects the [`DisplayMode`] downstream renderers use.
//!
//! Normalization never fails: every extraction degrades to `None` or an
//! empty list, and an unrecognized payload classifies as
//! [`ResponseShape::Unknown`] rather than erroring.

pub mod extract;
pub mod provider;
pub mod shape;

pub use extract::{normalize, DisplayMode, NormalizedResponse};
pub use provider::LlmProvider;
pub use shape::{detect, is_displayable, ResponseShape};

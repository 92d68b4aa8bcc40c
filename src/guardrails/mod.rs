//! Checks that sit on either side of an agent call.
//!
//! `input` refuses bad trip parameters before a prompt is built; `output`
//! turns the agent's text into a typed result or a classified error, using
//! `business`, `sanitize` and `safety` along the way and `fallback` when a
//! city list cannot be recovered.

pub mod business;
pub mod fallback;
pub mod input;
pub mod output;
pub mod safety;
pub mod sanitize;

pub use business::{validate_budget_constraints, BusinessViolation, ValidationContext};
pub use fallback::{fallback_city_document, fallback_city_recommendations};
pub use input::{validate_input, validate_input_on, InputRejection, InputVerdict};
pub use output::{
    validate_and_repair, ExpectedShape, OutputError, OutputErrorKind, OutputValidator,
    RepairOutcome, ShapeViolation,
};
pub use safety::is_content_safe;
pub use sanitize::sanitize_description;

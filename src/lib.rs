//! Scoring utilities behind the career-prep product: study tool
//! recommendations, placement test grading and result window estimates.
//!
//! Every scoring function is pure and total. Malformed input falls back to
//! neutral values; only [`result_window::predict_window`] can return nothing,
//! when its exam date cannot be read.

pub mod error;
pub mod input;
pub mod models;
pub mod personalize;
pub mod placement;
pub mod report;
pub mod result_window;

pub use personalize::recommend_tools;
pub use placement::evaluate_attempt;
pub use result_window::predict_window;

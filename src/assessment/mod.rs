//! Test scoring and certificate eligibility.

pub mod eligibility;
pub mod scoring;

pub use eligibility::{CourseSignals, CourseStage, EligibilityPolicy, EligibilityResult, compute_eligibility};
pub use scoring::{Score, grade_attempt, score_answers};

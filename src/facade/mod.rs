//! Extension-method logging facade
//!
//! A second, independent facade: loggers implement the two-method
//! [`LevelLogger`] contract, gate on ordinal [`Severity`] and report errors
//! with a stack filtered down to a per-severity frame budget.

pub mod ext;
pub mod severity;

pub use ext::{
    apply_stack_config, clear_frame_budget, default_frame_budgets, describe_error, frames_for,
    reset_frame_budgets, set_frame_budget, LevelLogger, LoggerExt, SinkLogger,
    MIN_STACK_FRAME_COUNT,
};
pub use severity::Severity;

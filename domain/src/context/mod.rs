//! Context management for a consensus run
//!
//! - [`ContextManager`] - Phase-scoped store of run artifacts
//! - [`TokenBudgetManager`] - Estimation and compression against a token ceiling

pub mod manager;
pub mod token_budget;

pub use manager::{ContextEntry, ContextManager, DebateRequest, EntryKind};
pub use token_budget::{
    BudgetOutcome, ReductionLog, ReductionReason, TokenBudget, TokenBudgetManager, language_rate,
};

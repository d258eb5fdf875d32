//! Core domain model types for mentionscout.
//!
//! - Opportunity and run status enums
//! - Query and opportunity records

mod records;
mod status;

pub use records::{Opportunity, Query};
pub use status::{OpportunityStatus, RunStatus};

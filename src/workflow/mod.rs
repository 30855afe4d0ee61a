//! Donation request workflow
//!
//! `Pending --approve--> Approved`, `Pending --reject--> Rejected`. Both
//! decisions are terminal and approval lists the donation in the catalog.

pub mod engine;

pub use engine::{ApprovalOutcome, DonationWorkflow};

//! Typed client for a Linear-style issue tracker API.
//!
//! This crate wraps the tracker's GraphQL endpoint behind the [`IssueTracker`]
//! trait: one async method per logical operation, typed inputs and outputs,
//! and a [`ClientError`] taxonomy instead of raw transport errors.
//!
//! Related records (an issue's team, assignee, labels) are never lazy-loaded.
//! Callers that need them ask for them explicitly via
//! [`IssueTracker::issue_relations`], which makes the enrichment round trip
//! visible at the call site.
//!
//! The trait seam exists so the plugin's service layer can be exercised
//! against an in-memory tracker in tests; [`LinearClient`] is the production
//! implementation.

pub mod client;
pub mod error;
pub mod tracker;
pub mod types;

pub use client::LinearClient;
pub use error::{ClientError, Result};
pub use tracker::IssueTracker;
pub use types::{
    Comment, CommentInput, Issue, IssueInput, IssueRelations, IssueUpdate, Label, Project,
    SearchFilters, Team, User, WorkflowState,
};

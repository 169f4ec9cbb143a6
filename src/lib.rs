//! SmartTraffic: a gated five-step workflow that turns an uploaded
//! traffic-violation document into an appeal recommendation.
//!
//! [`workflow`] holds the state and its pure transition rules,
//! [`service`] the backend client, and [`session`] the driver that ties
//! remote calls back into the workflow.

pub mod config;
pub mod error;
pub mod report;
pub mod service;
pub mod session;
pub mod ui;
pub mod workflow;

pub use error::FlowError;
pub use session::{FlowSession, SessionSettings};
pub use workflow::{Intent, Step, WorkflowEngine, WorkflowState};

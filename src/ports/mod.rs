//! Port traits for the collaborators the engine drives.

pub mod config_port;
pub mod data_port;
pub mod decision_port;
pub mod report_port;

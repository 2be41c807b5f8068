pub mod approvals;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod core;
pub mod nav;
pub mod notes;
pub mod session;
pub mod subjects;

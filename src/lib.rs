//! campusd: the college-management sidecar.
//!
//! The core is the session/role resolution flow: on launch, the cached
//! identity and the users/{uid} directory record decide which screen the
//! shell starts on, and the navigator enforces which transitions remain
//! reachable. Domain flows (approvals, subjects, attendance, assignments,
//! notes) are thin sequences of directory-store calls exposed over a
//! line-delimited JSON protocol.

pub mod db;
pub mod gateway;
pub mod ipc;
pub mod model;
pub mod nav;
pub mod session;

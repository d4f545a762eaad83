//! External-surface driver
//!
//! Process-wide entry points for hosts that own the window (a managed
//! runtime's activity, a C host) and step rendering themselves:
//!
//! - **`driver`**: safe Rust API (bind, release, initialize, render one
//!   frame, terminate, blocking run)
//! - **`ffi`**: the same as a C ABI that never unwinds
//! - **`registry`**: the non-owning pointer to the active platform
//! - **`link`**: the state shared between a platform and the binding thread
//!
//! Lock order: the pending-surface lock and the active-platform lock are
//! never held at the same time.

pub mod driver;
pub mod ffi;
pub mod link;
pub mod registry;

pub use driver::{DriverError, DriverResult};
pub use link::ExternalSurfaceLink;

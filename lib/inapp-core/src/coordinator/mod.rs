//! Display lifecycle of in-app messages.
//!
//! A [`DisplayContext`] accepts show requests and keeps at most one
//! [`DisplayCoordinator`] in its [`ActiveSlot`]. Each coordinator owns one
//! content surface and one presentation view and moves through [`Phase`]s:
//!
//! ```text
//! Idle -> Loading -> AwaitingRenderComplete -> Displaying <-> Detached -> Dismissing -> Terminal
//! ```

mod context;
mod display;
mod slot;
mod view_events;

pub use context::{DisplayContext, ShowHandle, ShowOutcome};
pub use display::{DisplayCoordinator, Phase};
pub use slot::ActiveSlot;

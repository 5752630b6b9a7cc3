//! Type-keyed publish/subscribe.
//!
//! Events are plain values of any `Send + Sync + 'static` type. A published
//! event reaches exactly the listeners subscribed for its concrete type;
//! there is no subtype or trait-based dispatch.
//!
//! Delivery is driven by an [`Executor`]:
//!
//! - [`Synchronous`] (the default) runs every listener on the publishing
//!   thread, in subscription order, before `publish` returns.
//! - [`TokioExecutor`] hands each delivery to tokio's blocking pool;
//!   `publish` returns immediately and no ordering is promised.
//!
//! A listener that returns an error or panics is logged and skipped; the
//! publisher and the remaining listeners are unaffected.

mod bus;
mod executor;

pub use bus::{EventBus, Listener};
pub use executor::{Executor, Synchronous, Task, TokioExecutor};

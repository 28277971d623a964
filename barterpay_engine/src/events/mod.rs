//! Typed, stateless pub-sub hooks for gateway events.
//!
//! Components subscribe to the events they care about by registering an async callback in [`EventHooks`]. Each
//! callback is driven by its own [`EventHandler`], which receives events over a tokio channel and runs the callback in
//! a spawned task. Callbacks only ever see the event itself, never the engine's internal state.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderFailedEvent, OrderPaidEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};

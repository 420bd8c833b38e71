pub mod events;
pub mod invoke;
pub mod notifications;
pub mod object_store;
pub mod parameters;
pub mod queue;

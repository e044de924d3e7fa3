pub mod events;
pub mod reconciler;

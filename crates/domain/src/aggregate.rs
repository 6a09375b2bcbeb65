//! Core aggregate and domain event traits.

use document_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events describe a change that a command decided to make. They are
/// named in past tense and are applied to the aggregate before it is written.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name, used for logging and metrics labels.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates persisted as a single document.
///
/// The whole aggregate is written on every change, so it must serialize to
/// the stored body. Commands never mutate it directly: they inspect the
/// current state and return events, and `apply` performs the change.
pub trait Aggregate: Default + Serialize + DeserializeOwned + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the document collection the aggregate is stored in.
    fn collection() -> &'static str;

    /// Returns true once the aggregate has been created.
    fn is_created(&self) -> bool;

    /// Returns the stored version the aggregate was loaded at.
    ///
    /// `Version::initial()` means the aggregate has never been written.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the command handler after loading or writing.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be deterministic and must not fail: every check belongs to the
    /// command that produced the event.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

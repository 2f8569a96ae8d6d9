//! Domain layer for rask-event-shipper.
//!
//! Contains the canonical types shared across all modules:
//! - `Event`: one analytics record as shipped on the wire
//! - `Envelope`: a signed event with its auth context
//! - `Properties`: validated, ordered property maps
//! - `ShipperError`: Top-level error type

pub mod envelope;
pub mod error;
pub mod event;
pub mod pattern;
pub mod properties;

pub use envelope::{Auth, Envelope};
pub use error::{ShipperError, ValidationError};
pub use event::{Event, EventType};
pub use pattern::{PatternError, StaticPattern};
pub use properties::{DATE_FORMAT, Properties, PropertyValue, validate_identifier};

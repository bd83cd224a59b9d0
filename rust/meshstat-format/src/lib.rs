//! Closed type vocabularies shared by the live data model and the summaries, the
//! self-typed [`Variant`] value, and the binary message stream every summary is
//! serialized with.

pub mod stream;
pub mod types;
pub mod variant;

pub use stream::{MessageReader, MessageWriter};
pub use types::{AttributeRole, DataObjectType, ElementType, FieldAssociation};
pub use variant::Variant;

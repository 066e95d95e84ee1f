// Adapters layer: concrete record sources behind the `RecordSource` port.

pub mod source;

pub use source::{InMemorySource, JsonFileSource};

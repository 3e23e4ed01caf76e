pub mod apply;
pub mod behavior;
pub mod content;
pub mod converters;
pub mod editor;
pub mod event;
pub mod schema;
pub mod selection;
pub mod selectors;
pub mod snapshot;

// Re-export key types for easier usage
pub use apply::{ApplyError, apply};
pub use behavior::{
    Action, Behavior, Engine, EngineConfig, EngineError, EventPattern, Host, NoopHost,
};
pub use content::{Block, Child, InlineObject, Key, MarkDef, ObjectBlock, Span, TextBlock};
pub use converters::{ConvertError, Converter, ConverterRegistry, TransferItem};
pub use editor::{Editor, EditorError, HostState, Patch};
pub use event::{Event, EventFamily, EventKind, Mutation};
pub use schema::Schema;
pub use selection::{Path, PathFlavor, Point, Selection};
pub use snapshot::Snapshot;

pub mod entries;
pub mod entry;
pub mod macros;
pub mod selection;
pub mod storage;
pub mod template;
pub mod wheel;

pub use entries::EntryStore;
pub use entry::{Entry, EntryId, Label, Weight};
pub use selection::{Segment, SelectionError};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
pub use template::{Template, TemplateStore};
pub use wheel::{WheelConfiguration, WheelError};

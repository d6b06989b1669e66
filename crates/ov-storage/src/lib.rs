//! OpenViking storage layer.

pub mod agfs;
pub mod directory;
pub mod local_fs;
pub mod recorder;
pub mod schema;
pub mod transaction;
pub mod viking_fs;

pub use agfs::AgFs;
pub use local_fs::{BytesRow, FileKvStore};
pub use recorder::{IoType, OperationStats, Player, RecordedCall, Recorder, ReplayReport};
pub use schema::{CollectionSchema, context_collection_schema};
pub use viking_fs::VikingFS;

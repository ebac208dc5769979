pub mod error;
pub mod persistence;
pub mod record_store;
pub mod session;
pub mod types;

pub use error::{ErrorKind, Outcome, Rejection, StoreError};
pub use persistence::{FilePersistence, MemoryPersistence, Persistence};
pub use record_store::RecordStore;
pub use session::{Session, STORAGE_KEY_PREFIX};
pub use types::{AppData, BackupInfo, Class, Evaluation, Settings, Snapshot, Student};

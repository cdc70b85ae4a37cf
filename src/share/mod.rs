pub mod clock;
pub mod error;
pub mod manager;
pub mod store;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ShareError;
pub use manager::{spawn_expiry_sweeper, ShareSnapshot, ShareTokenManager};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore, StoredSnapshot};
pub use token::{ShareToken, TokenDigest};

// Adapters layer: concrete implementations of the domain ports
// (settings store, blob store, image codec, clock).

pub mod clock;
pub mod codec;
pub mod storage;

pub use clock::{FixedClock, SystemClock};
pub use codec::{PortraitFormat, StandardCodec};
pub use storage::{JsonFileBackend, LocalBlobStore, MemoryBackend, MemoryBlobStore};

pub mod key_value;
pub mod verification_record;

pub use key_value::{InMemoryKeyValueStore, KeyValueStore};
pub use verification_record::{InMemoryVerificationRecordRepository, VerificationRecordRepository};

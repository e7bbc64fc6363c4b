/// All timestamps are UTC on the wire.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Distribution slots are numbered from 1 in configuration order.
pub type SlotNumber = u32;

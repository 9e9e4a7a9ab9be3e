// Report computations over tenant ledgers

pub mod recurring;

pub use recurring::{detect_recurring, merchant_key, DetectorConfig, Frequency, RecurringSeries, TransactionRecord};

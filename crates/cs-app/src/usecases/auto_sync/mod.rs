mod controller;

pub use controller::{
    AttemptOutcome, AutoSyncController, SyncAttemptRunner, CLIPBOARD_DEBOUNCE,
    MAX_CONSECUTIVE_FAILURES,
};

#![doc = include_str!("../README.md")]

pub mod types;
pub mod spin_lock;
pub mod shared_state;
pub mod workload;
pub mod verifier;
pub mod report;
pub mod sweep;

pub use types::{
    BenchmarkMode,
    LockVariant,
    TestParameters,
    TimingMillis,
};
pub use spin_lock::{
    SpinLock,
    SpinPolicy,
};
pub use shared_state::SharedState;
pub use workload::{
    BenchmarkableLock,
    run_workload,
};
pub use sweep::run_sweep;

pub mod worker_failed;

pub use worker_failed::*;

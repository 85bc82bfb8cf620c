#![forbid(unsafe_code)]

mod activity;
mod aggregates;
mod ingest;
mod search;

pub use activity::*;
pub use aggregates::*;
pub use ingest::*;
pub use search::*;

//! `cardiosync` - Record cardiac-failure observations and keep them in sync
//!
//! Each submission appends one patient observation to a local CSV dataset and
//! then creates or updates the single canonical copy of that dataset in a
//! remote store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod record;
pub mod remote;
pub mod resolver;
pub mod sync;

pub use config::Config;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Gender, Record};
pub use remote::{RemoteObject, RemoteStore};
pub use resolver::{resolve, Resolution};
pub use sync::{SubmitReport, Synchronizer, UploadOutcome};

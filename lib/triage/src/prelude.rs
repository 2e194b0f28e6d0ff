//! Prelude module for convenient imports.
//!
//! ```ignore
//! use triage::prelude::*;
//! ```

pub use crate::{
    Call, Callback, ClassifyingAdapterFactory, ClientConfig, Error, HyperClient, Outcome,
    PendingCall, QueueExecutor, RawCall, RawResponse, Response, Result, ServiceClient, delete,
    get, head, options, patch, post, put, service,
};
pub use serde::{Deserialize, Serialize};

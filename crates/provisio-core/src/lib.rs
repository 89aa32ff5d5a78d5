//! Provisio Core
//!
//! Reconciliation protocol shared by cloud resource operators: a tri-state
//! operation model, a bounded error taxonomy, work request polling,
//! read-after-write consistency and patch resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Orchestrator                    │
//! │      (create / update / delete / status)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                provisio-core                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   OperatorRegistry ─▶ ReadAfterWrite      │   │
//! │  │   trait ResourceOperator { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │ classifier │ │   poller   │ │   patch    │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │ provisio-oci  │
//!           │   operators   │
//!           └───────────────┘
//! ```

pub mod classify;
pub mod context;
pub mod error;
pub mod operation;
pub mod operator;
pub mod outcome;
pub mod patch;
pub mod poller;
pub mod read_after_write;
pub mod registry;

// Re-exports
pub use classify::{ClassifiableError, ServiceError, classify, find_service_error};
pub use context::OperationContext;
pub use error::{CoreError, Result, ResultExt};
pub use operation::{
    CreateRequest, DeleteRequest, ListRequest, ListResult, Operation, OperationErrorCode,
    OperationStatus, ProgressResult, ReadRequest, ReadResult, StatusRequest, UpdateRequest,
};
pub use operator::ResourceOperator;
pub use outcome::{handle_create_error, handle_delete_error, handle_update_error};
pub use patch::apply_patch_document;
pub use poller::{WorkRequest, WorkRequestPoller, WorkRequestSource, WorkRequestStatus};
pub use read_after_write::ReadAfterWrite;
pub use registry::{OperatorFactory, OperatorRegistry};

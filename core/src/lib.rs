//! TickTick Core Library
//!
//! Foundational domain models, error types and trait interfaces for the
//! TickTick MCP server. All other crates depend on the types defined here.
//!
//! # Architecture
//!
//! - [`models`] - Domain models (Task, Project, Tag, SyncState, ...)
//! - [`error`] - Error types and result handling
//! - [`api`] - Backend trait over the TickTick service
//! - [`protocol`] - Tool parameter types and the handler trait
//! - [`builder`] - Construction of new task payloads
//! - [`filter`] - Task filtering by status, properties and date windows
//! - [`time`] - ISO 8601 parsing and the TickTick wire date format
//! - [`validation`] - Input validation utilities
//!
//! # Example
//!
//! ```rust
//! use ticktick_core::builder::TaskBuilder;
//!
//! let mut builder = TaskBuilder::new("Quarterly report");
//! builder.due_date = Some("2024-08-01".to_string());
//! builder.time_zone = Some("UTC".to_string());
//!
//! let task = builder.build("inbox-id").unwrap();
//! assert_eq!(task.is_all_day, Some(true));
//! ```

pub mod api;
pub mod builder;
pub mod error;
pub mod filter;
pub mod models;
pub mod protocol;
pub mod time;
pub mod validation;

// Re-export commonly used types at the crate root for convenience
pub use api::TickTickApi;
pub use builder::TaskBuilder;
pub use error::{Result, TickTickError};
pub use filter::{FilterCriteria, PeriodFilter, StatusFilter, TaskFilter};
pub use models::{
    Priority, Project, ProjectFolder, SubtaskItem, SyncState, Tag, Task, STATUS_ACTIVE,
    STATUS_COMPLETED,
};
pub use protocol::{
    CompleteTaskParams, ConvertDatetimeParams, CreateTaskParams, CriteriaInput, DeleteTasksParams,
    FilterTasksParams, GetAllParams, GetByIdParams, GetTasksFromProjectParams, MakeSubtaskParams,
    MoveTaskParams, OneOrMany, ToolHandler, UpdateTaskParams,
};
pub use validation::{SearchKind, ToolValidator};

/// Current version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

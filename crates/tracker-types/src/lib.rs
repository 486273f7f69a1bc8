//! Common types module for the fleet tracker system.
//!
//! This module defines the records, workflow enums, request/response payloads
//! and list-view helpers shared by every tracker component. It provides a
//! centralized location for shared types to keep storage, engine and API in
//! agreement about the data they exchange.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Reference data records managed by administrators.
pub mod directory;
/// Pagination, search and sort helpers for list endpoints.
pub mod listing;
/// Purchase order records and line items.
pub mod order;
/// Purchase-order group records.
pub mod po_group;
/// Base trait for self-registering implementations.
pub mod registry;
/// Repair request records and line items.
pub mod repair;
/// Redacting wrapper for secrets read from configuration.
pub mod secret_string;
/// Storage namespaces for persisted records.
pub mod storage;
/// Column definitions of the paginated admin lists.
pub mod tables;
/// Utility functions for formatting and normalizing values.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;
/// Workflow states, actions and actor roles.
pub mod workflow;

pub use api::*;
pub use directory::*;
pub use listing::{ListQuery, Page, SortDir, TableColumns, TableRow};
pub use order::*;
pub use po_group::*;
pub use registry::ImplementationRegistry;
pub use repair::*;
pub use secret_string::SecretString;
pub use storage::*;
pub use tables::{PO_GROUP_TABLE, UNIT_TABLE, USER_TABLE, VENDOR_TABLE};
pub use utils::{
	day_prefix, format_us_phone, new_id, normalize_email, sequence_number, truncate_id,
};
pub use validation::*;
pub use workflow::*;

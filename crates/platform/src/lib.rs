//! `wv-platform`: clients for the services around the pipeline.
//!
//! | Port              | Implementation        | Backing                          |
//! |-------------------|-----------------------|----------------------------------|
//! | `WorkflowStarter` | `HttpWorkflowStarter` | Step Functions JSON protocol     |
//! | `MediaFetcher`    | `GraphMediaFetcher`   | messaging platform media API     |
//! | `ObjectStore`     | `FsObjectStore`       | `{object_root}/{bucket}/{key}`   |
//!
//! The router and the speech/file stages only see the traits.

pub mod media;
pub mod objects;
pub mod workflow;

pub use media::{GraphMediaFetcher, MediaFetcher};
pub use objects::{FsObjectStore, ObjectStore, ObjectUri};
pub use workflow::{HttpWorkflowStarter, WorkflowStarter};

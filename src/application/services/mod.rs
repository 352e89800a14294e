//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (CatalogSource, ViewStateCache)
//! but are themselves concrete structs, not traits.

mod catalog;
mod view;

pub use catalog::CatalogService;
pub use view::{FetchTicket, NodeCallback, ViewOptions, ViewService};

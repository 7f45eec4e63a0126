pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod presentation;

pub use catalog::{AddItemOutcome, Catalog, CatalogError, Category};
pub use domain::cart::{Cart, CartChange, CartLine};
pub use domain::product::{Product, ProductCode};
pub use domain::session::{Session, UserId};
pub use errors::{ApplicationError, InterfaceError};
pub use flows::{FlowEngine, FlowState, OrderSummary, Reply, Turn};

//! Domain models.
//!
//! These are validated domain objects, separate from both database rows (see
//! [`crate::db`]) and API transfer shapes (see [`crate::dto`]).

pub mod order;
pub mod page;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderClient, OrderItem, Payment};
pub use page::{PageRequest, Sort, SortDirection, SortField};
pub use product::{Category, Product, ProductDraft};
pub use user::{NewAccessToken, NewUser, User, UserCredentials};

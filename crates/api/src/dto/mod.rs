//! Wire types for the REST API.
//!
//! Response DTOs are projections of the domain models in [`crate::models`];
//! request DTOs carry `validator` rules that are checked by the
//! [`ValidatedJson`](crate::middleware::ValidatedJson) extractor before a
//! handler runs. Field names are camelCase and money is a JSON number.

pub mod order;
pub mod page;
pub mod product;
pub mod user;

pub use order::{ClientDto, NewOrderRequest, OrderDto, OrderItemDto, OrderItemRequest, PaymentDto};
pub use page::Page;
pub use product::{CategoryDto, ProductDto, ProductMinDto};
pub use user::UserDto;

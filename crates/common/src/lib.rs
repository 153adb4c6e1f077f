//! Shared value types for the order engine.
//!
//! Everything here is a plain value: typed identifiers, money amounts,
//! and the size axis along which products carry inventory.

pub mod ids;
pub mod money;
pub mod size;

pub use ids::{AddressId, CustomerId, OrderId, PaymentMethodId, ProductId};
pub use money::Money;
pub use size::{ParseSizeError, Size};

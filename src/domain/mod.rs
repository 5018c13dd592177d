//! Domain layer - core business logic and entities

pub mod pool;
pub mod price;
pub mod recommendation;
pub mod risk;

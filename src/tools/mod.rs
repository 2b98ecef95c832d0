//! External service clients
//!
//! Each client sits behind a trait so actions and the pricing pipeline can be
//! exercised against in-process stubs.

mod zerox;

pub use zerox::{PriceRequest, PriceResponse, PriceRoute, PriceSource, QuoteAdapter, ZeroExClient};

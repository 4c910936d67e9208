// ============================================================================
// Order Book Store Implementations
// ============================================================================

mod memory;

#[cfg(test)]
mod failing;

pub use memory::InMemoryOrderBookStore;

#[cfg(test)]
pub(crate) use failing::FailingOrderBookStore;

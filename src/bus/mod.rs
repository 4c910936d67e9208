// ============================================================================
// Message Bus Implementations
// ============================================================================

mod memory;

pub use memory::InMemoryMessageBus;

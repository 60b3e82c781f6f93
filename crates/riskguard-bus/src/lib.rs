mod bus;
mod kafka;
mod memory;
pub mod payloads;
pub mod topics;

pub use bus::MessageBus;
pub use kafka::KafkaMessageBus;
pub use memory::InMemoryMessageBus;

pub mod commands;
pub mod events;
pub mod types;

pub use commands::StoreCommand;
pub use events::StoreEvent;
pub use types::Message;

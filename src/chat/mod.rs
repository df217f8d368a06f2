//! The logical core of the chat screen: turning keystrokes into messages and
//! mirroring whatever the store reports back.

pub mod input;
pub mod mirror;
pub mod view;

pub use input::InputHandler;
pub use mirror::ChatMirror;
pub use view::{MessageRow, render};

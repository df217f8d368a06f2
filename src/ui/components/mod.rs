pub mod chat_area;
pub mod event_log;
pub mod input_bar;

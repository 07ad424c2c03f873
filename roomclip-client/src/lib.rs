pub mod api;
pub mod config;
pub mod console;
pub mod controller;
pub mod host_clipboard;
pub mod logging;
pub mod message_bus;
pub mod router;
pub mod runtime;
pub mod session;

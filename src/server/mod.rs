// Server module entry point
// Listener creation, the accept loop, per-connection tasks and the request
// head guard in front of hyper

pub mod connection;
pub mod guard;
pub mod listener;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::create_listener;
pub use server_loop::start_server_loop;

pub mod handler;
pub mod message_queue;
pub mod reporter;
pub mod task;

pub use handler::*;
pub use message_queue::*;
pub use reporter::*;
pub use task::*;

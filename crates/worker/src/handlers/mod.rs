//! Built-in handlers.
//!
//! | name | what it does |
//! |---|---|
//! | `in_process` | runs the task now, in the caller's task |
//! | `forget` | drops the work |
//! | `fork` | child process, capture on stdin |
//! | `disk` | durable file for a later recovery sweep |
//! | `runner` | runner entry point, base64 capture as argument |
//! | `message_queue` | publishes to a queue |
//! | `test` | records calls for assertions |

pub mod disk;
pub mod forget;
pub mod fork;
pub mod in_process;
pub mod message_queue;
pub mod process;
pub mod runner;
pub mod test;

pub use disk::DiskHandler;
pub use forget::ForgetHandler;
pub use fork::ForkHandler;
pub use in_process::InProcessHandler;
pub use message_queue::MessageQueueHandler;
pub use process::CompanionCommand;
pub use runner::RunnerHandler;
pub use test::TestHandler;

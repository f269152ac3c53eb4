pub mod companion;
pub mod factory;
pub mod handlers;
pub mod queue_worker;
pub mod reporters;
pub mod tasks;

pub use companion::{decode_payload, execute_payload};
pub use factory::RegistryFactory;
pub use handlers::*;
pub use queue_worker::{Delivery, QueueWorker};
pub use reporters::*;
pub use tasks::{register_builtin_tasks, LogTask, ShellTask};

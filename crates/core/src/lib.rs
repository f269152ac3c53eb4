pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod registry;
pub mod traits;

pub use self::config::*;
pub use errors::*;
pub use logging::init_logging;
pub use models::{
    Capture, EffectiveConfig, HandlerChain, HandlerOptions, HandlerSpec, Outcome, WorkItem,
};
pub use registry::{HandlerRegistry, ReporterRegistry, TaskRegistry};
pub use traits::{FnTask, Handler, MessageQueue, Reporter, Task};

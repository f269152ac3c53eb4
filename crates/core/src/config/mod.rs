//! 配置管理
//!
//! - **settings**: process-wide settings (`DeferSettings`) loaded with the
//!   `config` crate from a TOML file plus `DEFER__*` environment overrides
//! - **environment**: the deployment environment (`DEFER_ENV`)
//! - **named**: named configurations, `environment -> name -> {handler, reporter}`
//!   plus a `default` entry
//! - **source**: where named configurations are loaded from
//! - **resolver**: field-wise precedence merge producing an `EffectiveConfig`

pub mod environment;
pub mod named;
pub mod resolver;
pub mod settings;
pub mod source;

pub use environment::Environment;
pub use named::{ConfigEntry, NamedConfigurations};
pub use resolver::{CallSiteOptions, ConfigResolver};
pub use settings::{
    DeferSettings, DiskSettings, LoggingSettings, MessageQueueSettings, MessageQueueType,
    NotificationSettings, ProcessDefaults, ProcessSettings,
};
pub use source::{ConfigurationSource, FileConfigurationSource, StaticConfigurationSource};

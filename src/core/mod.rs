pub mod aggregate;
pub mod discovery;
pub mod error_log;
pub mod layout;
pub mod modules;
pub mod monitor;
pub mod normalize;

pub use crate::domain::model::{ErrorIndex, MetricMap, ModuleRecord};
pub use crate::domain::ports::{CommandSource, ConfigProvider, Connector, MetricSink};
pub use crate::utils::error::Result;

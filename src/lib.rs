pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod shutdown;
pub mod worker;

pub use config::{DispatcherConfig, SignalPolicy, WorkConfig};
pub use dispatcher::{Dispatcher, Snapshot, Summary};
pub use error::{DispatchError, Result};
pub use events::DispatchEvent;

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod report;
pub mod schema;
pub mod ui;
pub mod writer;

pub use bootstrap::{run, RunSummary};
pub use cli::Cli;
pub use config::BootstrapConfig;
pub use error::{BootstrapError, ErrorKind, SourceDataError};
pub use ui::{LogUi, Phase, SilentUi, Ui};

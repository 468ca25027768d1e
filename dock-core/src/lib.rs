pub mod command_stream;
pub mod error;

pub use command_stream::{CommandError, CommandOutput};
pub use error::{DockError, ErrorKind, Result, Step, StepContext};

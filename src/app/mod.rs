pub mod script;
pub mod session;

pub use script::{parse_script, run_script, Command, ScriptError};
pub use session::Session;

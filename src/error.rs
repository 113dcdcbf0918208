use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read VM list from {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run `{command}`")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    HypervisorCommand {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("could not read {field} from nodeinfo output")]
    NodeInfoParse { field: &'static str },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

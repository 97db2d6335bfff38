//! Client-side session logic for managing one folder of services.

pub mod error;
pub mod http_remote;
pub mod ids;
pub mod remote;
mod session;
pub mod status;

pub use error::SessionError;
pub use http_remote::HttpFolderRemote;
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use remote::{FolderRemote, SimulatedFolderRemote, DEFAULT_SIMULATED_LATENCY};
pub use session::{BusyPolicy, FolderSessionController, SessionPhase, SessionSnapshot};
pub use status::SessionStatus;

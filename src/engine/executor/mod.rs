mod channel;
mod context;
mod host;
mod kill_handle;
mod traits;


pub use channel::{ChannelExecutor, RemoteMessage};
pub use context::OperationContext;
pub use host::CursorHost;
pub use kill_handle::KillCursorsHandle;
pub use traits::{CursorResponse, GetMoreRequest, KillCursorsRequest, TaskExecutor};

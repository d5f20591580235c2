//! Stand-ins for the engine's transport and clock

mod clock;
mod transport;

pub use clock::ManualClock;
pub use transport::{ScriptedConnector, ScriptedReply, ScriptedServer, ScriptedTransport};

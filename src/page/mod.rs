pub mod agent;
pub mod navigation;
pub mod session;
pub mod sim;
pub mod surface;

pub use agent::{Injection, PageAgent};
pub use navigation::NavigationSignal;
pub use session::AgentSessionState;
pub use sim::{SimulatedMedia, SimulatedPage};
pub use surface::{MediaElement, PageSurface, PlaybackState, SuppressionMode};

pub mod alerts;
pub mod geolocation;
pub mod inventory;
pub mod markers;
pub mod navigation;
pub mod proximity;
pub mod recorder;
pub mod routing;
pub mod session;
pub mod share;
pub mod simplify;

pub use alerts::{AlertSink, NoopAlerts, TracingAlerts};
pub use navigation::{NavigationEvent, NavigationPlanner, NavigationState};
pub use routing::{DirectionsService, OsrmClient, RoutingClient};
pub use session::{MapObserver, SessionHandle, TrackingSession};

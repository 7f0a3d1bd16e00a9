pub mod billboard;
pub mod coordinates;
pub mod distance;
pub mod geo;
pub mod navigation;
pub mod route;

pub use billboard::{Billboard, BillboardStatus};
pub use coordinates::GeoPoint;
pub use distance::{DistanceMeters, DurationSeconds};
pub use geo::BoundingBox;
pub use navigation::{LocationFix, NavigationTarget, RoutePoint};
pub use route::{LegSummary, RouteResult};

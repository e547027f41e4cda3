//! Panel geometry
//!
//! Concrete providers of the geometric capabilities the solver consumes:
//!
//! - `panel`: quadrilateral elements and their elementary singularity kernels
//! - `surface`: panel collections with stable identity and surface operators
//! - `lifting`: surfaces with spanwise trailing-edge topology
//! - `wake`: growable sheets of shed vorticity
//! - `generators`: analytical test geometries (sphere, wing sections)

pub mod generators;
pub mod lifting;
pub mod panel;
pub mod surface;
pub mod wake;

pub use lifting::{LiftingSurface, TrailingEdge};
pub use panel::Panel;
pub use surface::{Surface, SurfaceId};
pub use wake::Wake;

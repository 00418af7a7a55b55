pub mod color;
pub mod error;
pub mod record;
pub mod state;

pub use color::{Color, JAM_TINT};
pub use error::SegmentError;
pub use record::TrafficRecord;
pub use state::DerivedAnimationState;

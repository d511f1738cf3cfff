//! Clipforge Playback - clock and editing session
//!
//! The session owns one timeline, one playback clock and one compositor
//! (with its frame cache). It is driven by a display-synchronised tick.

pub mod clock;
pub mod config;
pub mod session;

pub use clock::{PlaybackClock, PlaybackState, Tick};
pub use config::SessionConfig;
pub use session::{EditSession, RenderTicket};

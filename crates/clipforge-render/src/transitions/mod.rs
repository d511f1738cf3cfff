//! Built-in transition implementations.

mod dissolve;
mod fade;
mod wipe;

pub use dissolve::Dissolve;
pub use fade::Fade;
pub use wipe::{reveal_rect, Wipe};

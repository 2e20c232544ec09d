pub mod arena;
pub mod snapshot;

pub use arena::{ArenaNode, UiArena};
pub use snapshot::{Bounds, ScreenSize, UiElement, UiSnapshot};

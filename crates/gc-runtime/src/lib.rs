/// Render loop runtime for glyphcast.
///
/// Drives the frame converter at the source's delivery rate through an
/// explicit scheduling trait, so the core logic is host-agnostic and can be
/// stepped synchronously by tests.
pub mod fps;
pub mod render_loop;
pub mod scheduler;

pub use render_loop::{LoopState, RenderLoop};
pub use scheduler::{PendingTick, TickScheduler};

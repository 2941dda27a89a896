pub mod progress;
pub mod timer;

pub use progress::sleep_with_progress;
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};

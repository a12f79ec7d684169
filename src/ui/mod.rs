pub mod board;
pub mod icons;
pub mod progress;

pub use progress::DraftUI;

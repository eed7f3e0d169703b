pub mod employee;
pub mod macros;
pub mod operation;
pub mod schedule;
pub mod shift;

// Re-export all models for easy importing
pub use employee::*;
pub use operation::*;
pub use schedule::*;
pub use shift::*;

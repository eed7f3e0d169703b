pub mod editors;
pub mod reference;
pub mod shared;

pub mod context;
pub mod gate;
pub mod identity;

pub mod analyze;
pub mod detect;
pub mod sections;

mod shared;

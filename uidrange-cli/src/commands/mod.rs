pub mod check;
pub mod ranges;

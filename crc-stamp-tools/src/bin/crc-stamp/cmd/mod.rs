pub mod check;
pub mod stamp;

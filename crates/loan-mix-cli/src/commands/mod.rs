pub mod cost;
pub mod intake;
pub mod optimize;

pub mod activity;
pub mod coordinate;
pub mod user;
pub mod zone;

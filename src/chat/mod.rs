pub mod client;
pub mod compose;
pub mod models;
pub mod session;

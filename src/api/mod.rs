mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use server::{router, run};

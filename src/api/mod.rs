mod client;
mod envelope;

pub use client::{Api, ApiError, LoginRequest, RegisterRequest};
pub use envelope::Envelope;

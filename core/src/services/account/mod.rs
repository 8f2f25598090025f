//! Registration and password reset flows built on the OTP manager

mod service;


pub use service::{AccountService, RegistrationResult};

//! Business services containing domain logic and use cases.

pub mod account;
pub mod otp;
pub mod password;
pub mod token;

// Re-export commonly used types
pub use account::{AccountService, RegistrationResult};
pub use otp::{
    Clock, DeliveryChannel, DeliveryContext, DeliveryError, IdentityLookup, ManualClock,
    OtpCleanupConfig, OtpCleanupService, OtpManager, OtpManagerConfig, Recipient,
    SendCodeResult, SystemClock, VerifyCodeResult,
};
pub use password::PasswordService;
pub use token::{TokenService, TokenServiceConfig};

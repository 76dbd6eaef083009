pub mod deps;
pub mod platform;
pub mod release;
pub mod service;

pub use platform::{Arch, Level, Platform};
pub use service::ServiceManager;

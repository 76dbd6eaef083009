pub mod config;
pub mod installer;
pub mod menu;
pub mod network;
pub mod protocol;
pub mod system;
pub mod utils;

pub use config::Settings;
pub use installer::Installer;
pub use protocol::VlessEncryption;

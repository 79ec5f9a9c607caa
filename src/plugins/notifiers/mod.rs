pub mod browser;
pub mod discord;
pub mod sound;

pub use browser::BrowserNotifier;
pub use discord::{DiscordConfig, DiscordNotifier};
pub use sound::SoundNotifier;

mod clock;
mod delivery;
mod home_automation;
mod image;

pub use clock::Clock;
pub use delivery::{BackupStore, SmsSender};
pub use home_automation::HomeAutomation;
pub use image::{ImageAnalyzer, ImageFetcher};

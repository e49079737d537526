pub mod audio;
pub mod backend;
pub mod browse;
pub mod catalog;
pub mod catalog_client;
pub mod config;
pub mod error;
#[cfg(feature = "native-audio")]
pub mod media_controls;
pub mod playback;
pub mod player;
#[cfg(feature = "native-audio")]
pub mod rodio_output;
pub mod search;
pub mod store;

pub use audio::*;
pub use backend::*;
pub use browse::*;
pub use catalog::*;
pub use catalog_client::*;
pub use config::*;
pub use error::*;
#[cfg(feature = "native-audio")]
pub use media_controls::*;
pub use playback::*;
pub use player::*;
#[cfg(feature = "native-audio")]
pub use rodio_output::*;
pub use search::*;
pub use store::*;

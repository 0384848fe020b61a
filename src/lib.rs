pub mod app;
pub mod audio;
pub mod audio_io;
pub mod buffer;
pub mod config;
pub mod editor;
pub mod fsops;
pub mod library;

pub use app::{SoundManager, StartupConfig};
pub use buffer::AudioBuffer;
pub use editor::EditorSession;

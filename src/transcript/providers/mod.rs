// Reference transcript providers

pub mod audio;
pub mod captions;
pub mod subtitles;

pub use audio::{AudioTranscriptionProvider, PollConfig};
pub use captions::CaptionTrackProvider;
pub use subtitles::SubtitleFileProvider;

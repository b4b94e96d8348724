// Concrete collaborators behind the provider capability traits

pub mod assembly_ai;
pub mod youtube;
pub mod ytdlp;

pub use assembly_ai::AssemblyAi;
pub use youtube::YoutubeCaptionIndex;
pub use ytdlp::YtDlp;

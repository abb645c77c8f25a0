pub mod sources;
pub mod tailer;
pub mod udp;

pub use sources::SourceManager;
pub use tailer::FileTailer;
pub use udp::UdpReceiver;

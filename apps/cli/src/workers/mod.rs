pub mod audio_cue;
pub mod response_journal;
pub mod response_transport;
pub mod session_summary;

//! Wire formats of the MU Online client protocol.
//!
//! This crate knows how packets are framed, how client revisions are
//! identified and how the request bodies used by the server handlers are laid
//! out. It performs no dispatching of its own.

pub mod codec;
pub mod header;
pub mod packets;
pub mod version;
pub mod walk;

pub use codec::{CodecError, CodecLimits, FrameCodec};
pub use header::{
    C1, C2, C3, C4, ENCRYPTION_THRESHOLD, FrameBuilder, FrameError, FrameHeader, HeaderKind,
    read_header, sub_opcode_at,
};
pub use packets::{
    AnimationRequest, CharacterCreateRequest, CharacterDeleteRequest, CharacterSelectRequest,
    ChatRequest, EnterEventRequest, EventRemainTimeRequest, HitRequest, LoginRequest, LogoutKind,
    LogoutRequest, PacketError, PingRequest, WalkRequest, WhisperRequest,
};
pub use version::{ClientVersion, Language, VersionParseError, VersionRange};
pub use walk::{MAX_WALK_STEPS, WalkPath, WalkStep, decode_walk_path, encode_walk_directions};

/// Returns the protocol crate version string.
pub fn protocol_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod channel;
pub mod codec;
pub mod signer;
pub mod stats;

pub use channel::{
    ACCEPTED_STATUS, ChannelConfig, ChannelError, HttpChannel, INGEST_PATH, PostResponse,
    UploadChannel,
};
pub use codec::{CodecError, Compress};
pub use signer::{Credentials, sign, sign_content};
pub use stats::{UploadStats, UploadStatsSnapshot};

//! Platform stand-ins: URI intents, lifecycle signal and the link opener.

mod channel;
mod opener;

pub use channel::{ChannelLifecycle, ChannelLinkSource};
pub use opener::LoopbackLinkOpener;

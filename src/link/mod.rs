//! Line-oriented command link.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      Link Stack                            │
//! │                                                            │
//! │  ┌───────────┐   ┌────────────┐   ┌─────────────────────┐  │
//! │  │ Transport │──▶│ LineDecoder│──▶│ DeviceService       │  │
//! │  │ (trait)   │   │ (framing)  │   │ (command dispatch)  │  │
//! │  └───────────┘   └────────────┘   └─────────────────────┘  │
//! │       ▲                                    │               │
//! │       └──────────── send_line ◀────────────┘               │
//! │                 (responses, heartbeats)                    │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod channel;
pub mod codec;
pub mod transport;

pub use channel::LineChannel;
pub use codec::{LineDecoder, MAX_LINE};
pub use transport::Transport;

//! # Events Module
//!
//! Progress reporting for pipeline runs.
//!
//! ## Design
//! Stages publish events through a channel so any front end (the CLI
//! progress bar, a test) can observe a run without the core knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Stage(StageEvent::ItemProcessed(p)) = event {
//!             println!("{}: {} done", p.stage, p.completed);
//!         }
//!     }
//! });
//!
//! Signer::builder().events(sender).build()?.sign(&[0, 1])?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;

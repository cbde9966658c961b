//! # Events Module
//!
//! Typed progress events for front ends.
//!
//! ## Design
//! The engine emits serde-serialisable events through a channel carried in
//! the run context. Any front end can subscribe; with no subscriber the
//! events are dropped.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! // In a separate thread, listen for events
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Scan(ScanEvent::Progress(p)) => println!("Found {} files", p.files_found),
//!             Event::Fingerprint(FingerprintEvent::Progress(p)) => {
//!                 println!("Hashed {}/{}", p.completed, p.total)
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! // Run the pipeline with the sender
//! pipeline.run_with_events(&sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;

//! # Events Module
//!
//! Progress reporting for the pipeline.
//!
//! ## Design
//! The core library emits events through channels, allowing the CLI (or
//! any other front end) to subscribe and display progress without the core
//! knowing how it is rendered.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Hash(HashEvent::Progress(p)) = event {
//!             println!("Hashed {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&mut sinks, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;

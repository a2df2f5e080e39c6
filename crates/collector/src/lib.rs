//! # Collector
//!
//! Client side of the relay.
//!
//! Responsibilities:
//! - Assemble one complete `Sample` per tick from a `SensorSuite`
//! - Substitute synthetic values for faulted sensors
//! - Drive the periodic collection session (start / stop / teardown)
//! - Render samples and transient delivery notices
//! - Persist the collector instance id

pub mod assembler;
pub mod collection_loop;
pub mod display;
pub mod error;
pub mod instance;
pub mod notice;
pub mod synthetic;

pub use assembler::SampleAssembler;
pub use collection_loop::{CollectionLoop, SessionStatus, Transition};
pub use display::{ConsoleDisplay, DisplayEvent, MemoryDisplay, SampleDisplay};
pub use error::{CollectorError, Result};
pub use instance::{InstanceIdStore, INSTANCE_ID_KEY};
pub use notice::{Notice, NoticeBoard, NoticeLevel, NoticeTtl};

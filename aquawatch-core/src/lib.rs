//! AquaWatch core library
//!
//! Domain model and evaluation pipeline for the water-treatment alarm
//! engine: tag classification, multi-tier limit resolution, breach
//! evaluation, cooldown debouncing, and the dispatcher seam the worker
//! binary plugs its notification channels into.

pub mod breach;
pub mod cooldown;
pub mod dispatch;
pub mod engine;
pub mod limits;
pub mod model;
pub mod signal;

pub use breach::is_breach;
pub use cooldown::CooldownTracker;
pub use dispatch::{AlertDispatcher, ChannelError};
pub use engine::{AlarmEngine, EngineConfig, ReadingDisposition};
pub use limits::{resolve, DefaultLimits, Direction, DirectionPolicy, LimitOrigin, ResolvedLimit};
pub use model::{BreachAlert, GlobalAlarmConfig, LimitEntry, NotificationOutcome, SensorReading};
pub use signal::{classify, SignalType};

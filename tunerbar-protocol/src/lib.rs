//! Data model for the tunerbar front-end.
//!
//! This crate defines the records enumerated from the EpgTimerSrv scheduling
//! service and the keys used to cross-reference them:
//!
//! - [`ServiceKey`]: a channel, identified by TSID + SID
//! - [`EventKey`]: one program instance on a channel (TSID + SID + event id)
//! - [`ServiceEvent`], [`ProgramEvent`]: program guide
//! - [`Reservation`], [`TunerState`], [`RecordedFile`]: recorder state
//! - [`BandType`]: Terrestrial/BS/CS classification by original network id
//! - [`ErrCode`]: command result codes
//!
//! ```rust
//! use tunerbar_protocol::{BandType, EventKey, ServiceKey};
//!
//! let key = EventKey::new(32736, 1024, 0x1234);
//! assert_eq!(key.service, ServiceKey::new(32736, 1024));
//! assert_eq!(BandType::from_nid(0x7FE8), BandType::Terrestrial);
//! ```

pub mod error;
pub mod types;

pub use error::ErrCode;
pub use types::{
    BandType, EventKey, Overlap, ProgramEvent, RecordedFile, Reservation, ServiceEvent,
    ServiceInfo, ServiceKey, ShortInfo, TunerState, REC_MODE_DISABLED_BASE, UNNUMBERED_TUNER_ID,
};

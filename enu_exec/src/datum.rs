//! # Datum Manager
//!
//! The datum is the geodetic origin of the local ENU frame. It is chosen once, when the first fix
//! arrives, and never changes afterwards. If the parameters give a datum that is always used,
//! which keeps the local frame the same across runs at the same site. Otherwise the first fix
//! becomes the datum.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::gnss::{Datum, GeodeticFix};
use log::info;

use crate::latch::Latch;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DatumMgr {
    /// Datum from the parameters, if one was fully specified
    configured: Option<Datum>,

    datum: Latch<Datum>,

    /// Datum waiting to be announced to the rest of the system
    pending_announcement: Option<Datum>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DatumMgr {
    pub fn new(configured: Option<Datum>) -> Self {
        Self {
            configured,
            datum: Latch::Unset,
            pending_announcement: None,
        }
    }

    /// Get the datum, establishing it from the parameters or from `fix` if this is the first call.
    pub fn ensure_datum(&mut self, fix: &GeodeticFix) -> Datum {
        let configured = self.configured;
        let pending_announcement = &mut self.pending_announcement;

        self.datum.get_or_set_with(|| {
            let datum = match configured {
                Some(d) => {
                    info!("Using datum provided by parameters: {:?}", d);
                    d
                }
                None => {
                    info!("Using initial position fix as datum: {:?}", fix.position);
                    fix.position
                }
            };

            *pending_announcement = Some(datum);
            datum
        })
    }

    /// The datum, or `None` if no fix has been processed yet.
    pub fn datum(&self) -> Option<Datum> {
        self.datum.get().copied()
    }

    /// Take the datum announcement, if the datum was established since the last call.
    ///
    /// This returns `Some` exactly once in the lifetime of the manager.
    pub fn take_announcement(&mut self) -> Option<Datum> {
        self.pending_announcement.take()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

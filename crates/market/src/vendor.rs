//! Vendor selection table.
//!
//! Every vendor reads its global instruments from the primary provider. The
//! table only records which auxiliary source, if any, a vendor overlays and
//! which instruments that overlay replaces.

use market_core::{Instrument, Vendor};
use serde::{Deserialize, Serialize};

/// An auxiliary provider slot in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuxiliarySource {
    /// Scraped CN-market overview page.
    CnMarket,
}

/// The overlay a vendor applies on top of the primary batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayPlan {
    /// Provider slot supplying the overlay.
    pub source: AuxiliarySource,
    /// Instruments whose records the overlay replaces.
    pub instruments: &'static [Instrument],
}

/// Table row for one vendor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VendorProfile {
    /// The vendor.
    pub vendor: Vendor,
    /// Overlay applied after the primary fetch, if any.
    pub overlay: Option<OverlayPlan>,
}

const CN_ALL: OverlayPlan = OverlayPlan {
    source: AuxiliarySource::CnMarket,
    instruments: &Instrument::CN_MARKET,
};

const CN_EXCHANGES: OverlayPlan = OverlayPlan {
    source: AuxiliarySource::CnMarket,
    instruments: &[Instrument::SseComposite, Instrument::SzseComponent],
};

/// Vendor to overlay mapping.
///
/// The limit-up and dragon-tiger vendors overlay exactly what East Money does.
pub static VENDOR_TABLE: [VendorProfile; 7] = [
    VendorProfile {
        vendor: Vendor::Yahoo,
        overlay: None,
    },
    VendorProfile {
        vendor: Vendor::Qq,
        overlay: Some(CN_ALL),
    },
    VendorProfile {
        vendor: Vendor::Sina,
        overlay: Some(CN_ALL),
    },
    VendorProfile {
        vendor: Vendor::Netease,
        overlay: Some(CN_EXCHANGES),
    },
    VendorProfile {
        vendor: Vendor::Eastmoney,
        overlay: Some(CN_ALL),
    },
    VendorProfile {
        vendor: Vendor::EastmoneyLimitup,
        overlay: Some(CN_ALL),
    },
    VendorProfile {
        vendor: Vendor::EastmoneyLhb,
        overlay: Some(CN_ALL),
    },
];

/// Looks up a vendor's table row.
#[must_use]
pub fn profile(vendor: Vendor) -> &'static VendorProfile {
    // Each vendor has exactly one row; the fallback is the primary-only row.
    VENDOR_TABLE
        .iter()
        .find(|row| row.vendor == vendor)
        .unwrap_or(&VENDOR_TABLE[0])
}

/// The overlay a vendor applies.
#[must_use]
pub fn overlay_for(vendor: Vendor) -> Option<OverlayPlan> {
    profile(vendor).overlay
}

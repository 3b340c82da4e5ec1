//! Vendor identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The vendor a fetch cycle is run for.
///
/// Every vendor reads the global indicators from the primary provider; the
/// vendor decides which CN-market indices, if any, are overlaid on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vendor {
    /// Yahoo Finance only.
    Yahoo,
    /// Tencent.
    Qq,
    /// Sina.
    Sina,
    /// NetEase.
    Netease,
    /// East Money.
    Eastmoney,
    /// East Money limit-up board.
    EastmoneyLimitup,
    /// East Money dragon-tiger list.
    EastmoneyLhb,
}

impl Vendor {
    /// Command-line identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Qq => "qq",
            Self::Sina => "sina",
            Self::Netease => "netease",
            Self::Eastmoney => "eastmoney",
            Self::EastmoneyLimitup => "eastmoney-limitup",
            Self::EastmoneyLhb => "eastmoney-lhb",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

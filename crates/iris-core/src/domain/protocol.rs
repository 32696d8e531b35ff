//! External protocol descriptors.
//!
//! The external line may carry either of two protocols.  Exactly one is
//! current at any time; the cycle key steps through them in a ring.

use serde::{Deserialize, Serialize};

/// Protocol spoken by the peer on the external line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalProtocol {
    /// Length-prefixed `STX … ETX` frames; the bridge translates keys itself.
    #[default]
    Eurobraille,
    /// The same escaped `SOH … EOT` frames as the internal line, passed through.
    Native,
}

impl ExternalProtocol {
    /// Every protocol, in cycling order.
    pub const ALL: [ExternalProtocol; 2] = [ExternalProtocol::Eurobraille, ExternalProtocol::Native];

    /// Name shown to the operator and written to logs.
    pub fn name(self) -> &'static str {
        match self {
            ExternalProtocol::Eurobraille => "Eurobraille",
            ExternalProtocol::Native => "native",
        }
    }

    /// Line speed of the external port while this protocol is active.
    pub fn baud(self) -> u32 {
        match self {
            ExternalProtocol::Eurobraille => 9600,
            ExternalProtocol::Native => 57600,
        }
    }

    /// Whether acknowledgements from the onboard controller are echoed to the peer.
    pub fn forwards_acknowledgements(self) -> bool {
        matches!(self, ExternalProtocol::Native)
    }

    /// The protocol selected by the next press of the cycle key.
    pub fn next(self) -> Self {
        match self {
            ExternalProtocol::Eurobraille => ExternalProtocol::Native,
            ExternalProtocol::Native => ExternalProtocol::Eurobraille,
        }
    }
}

impl std::fmt::Display for ExternalProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

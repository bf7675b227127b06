//! EAP method and inner-authentication code tables.

use std::fmt;

/// Outer EAP method of a Passpoint profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EapMethod {
    Ttls,
    Peap,
    Tls,
    /// A label this server has no code for. Mapped to TTLS when encoded.
    Unknown(String),
}

impl EapMethod {
    /// Parse an operator-supplied label, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "TTLS" | "EAP-TTLS" => Self::Ttls,
            "PEAP" | "EAP-PEAP" => Self::Peap,
            "TLS" | "EAP-TLS" => Self::Tls,
            _ => Self::Unknown(label.to_string()),
        }
    }

    /// IANA EAP type code. Unknown methods encode as TTLS (21).
    pub const fn type_code(&self) -> u8 {
        match self {
            Self::Ttls | Self::Unknown(_) => 21,
            Self::Peap => 25,
            Self::Tls => 13,
        }
    }

    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Label shown to users configuring a device by hand.
    pub const fn display_label(&self) -> &'static str {
        match self {
            Self::Ttls | Self::Unknown(_) => "TTLS",
            Self::Peap => "PEAP",
            Self::Tls => "TLS",
        }
    }
}

impl fmt::Display for EapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(label) => write!(f, "{label}"),
            known => f.write_str(known.display_label()),
        }
    }
}

/// Inner (phase-2) authentication of a tunnelled EAP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerAuth {
    MsChapV2,
    Pap,
    Chap,
    /// Unrecognised label. Mapped to MSCHAPv2 when encoded.
    Unknown(String),
}

impl InnerAuth {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "MSCHAPV2" | "MS-CHAPV2" | "MSCHAP-V2" => Self::MsChapV2,
            "PAP" => Self::Pap,
            "CHAP" => Self::Chap,
            _ => Self::Unknown(label.to_string()),
        }
    }

    /// Numeric inner-authentication code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::MsChapV2 | Self::Unknown(_) => 2,
            Self::Pap => 0,
            Self::Chap => 1,
        }
    }

    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Name as Apple's `TTLSInnerAuthentication` and Android's phase-2 menu spell it.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MsChapV2 | Self::Unknown(_) => "MSCHAPv2",
            Self::Pap => "PAP",
            Self::Chap => "CHAP",
        }
    }
}

impl fmt::Display for InnerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(label) => write!(f, "{label}"),
            known => f.write_str(known.name()),
        }
    }
}

// Controller platform detection types
//
// The legacy API lives at different paths depending on whether the
// controller is a UniFi OS console or a standalone Network Application.

use strum::{Display, EnumString};

/// The platform type of the UniFi controller.
///
/// Determines URL prefixes and login paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ControllerPlatform {
    /// UniFi OS device (UDM, UCG, etc.) -- port 443, `/proxy/network/` prefix.
    #[strum(to_string = "unifi-os", serialize = "unifios", ascii_case_insensitive)]
    UnifiOs,
    /// Standalone Network Application (Java) -- port 8443, no prefix.
    #[strum(to_string = "classic", serialize = "standalone", ascii_case_insensitive)]
    ClassicController,
}

impl ControllerPlatform {
    /// The path prefix for legacy API endpoints.
    pub fn legacy_prefix(&self) -> &'static str {
        match self {
            Self::UnifiOs => "/proxy/network",
            Self::ClassicController => "",
        }
    }

    /// The login endpoint path.
    pub fn login_path(&self) -> &'static str {
        match self {
            Self::UnifiOs => "/api/auth/login",
            Self::ClassicController => "/api/login",
        }
    }

    /// The logout endpoint path.
    pub fn logout_path(&self) -> &'static str {
        match self {
            Self::UnifiOs => "/api/auth/logout",
            Self::ClassicController => "/api/logout",
        }
    }
}

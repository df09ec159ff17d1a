//! Common type definitions shared across crates.

use std::fmt;

/// A configured network: a primary bucket paired with an optional secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    Mainnet,
    /// Test network.
    Testnet,
}

impl Network {
    /// All networks, in processing order.
    pub const ALL: [Self; 2] = [Self::Mainnet, Self::Testnet];

    /// Lower-case identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// Environment variable prefix for the primary store (`MAINNET`).
    #[must_use]
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "MAINNET",
            Self::Testnet => "TESTNET",
        }
    }

    /// Environment variable prefix for the secondary store (`MAINNET2`).
    #[must_use]
    pub fn secondary_env_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "MAINNET2",
            Self::Testnet => "TESTNET2",
        }
    }

    /// Title used in console headers (`Mainnet`).
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Mainnet => "Mainnet",
            Self::Testnet => "Testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mask a secret for display.
///
/// Values longer than eight characters keep their first and last four
/// characters; anything shorter is replaced entirely.
///
/// # Examples
///
/// ```
/// use reconcile_core::mask_secret;
///
/// assert_eq!(mask_secret("AKIAEXAMPLEKEY42"), "AKIA********EY42");
/// assert_eq!(mask_secret("short"), "****");
/// ```
#[must_use]
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "****".to_owned();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

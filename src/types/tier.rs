use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Request-quality selector forwarded with every question.
///
/// The client treats the tier as an opaque flag; the service decides which
/// processing path it maps to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// The standard tier.
    #[default]
    Free,
    /// The slower, deeper tier.
    Pro,
}

impl Tier {
    /// Returns the wire name of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" | "standard" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(Error::validation(
                format!("unknown tier '{other}'"),
                Some("tier".to_string()),
            )),
        }
    }
}

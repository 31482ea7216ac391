// CLASSIFICATION: COMMUNITY
// Filename: grade.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use std::fmt;
use std::str::FromStr;

use crate::error::CloudInitError;

/// Trust tier of the device model. Decides how much seed-area cloud-init
/// configuration may be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustGrade {
    Secured,
    Signed,
    Dangerous,
}

impl TrustGrade {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secured => "secured",
            Self::Signed => "signed",
            Self::Dangerous => "dangerous",
        }
    }
}

impl fmt::Display for TrustGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustGrade {
    type Err = CloudInitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secured" => Ok(Self::Secured),
            "signed" => Ok(Self::Signed),
            "dangerous" => Ok(Self::Dangerous),
            _ => Err(CloudInitError::UnknownGrade(s.to_string())),
        }
    }
}

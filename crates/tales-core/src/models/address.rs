use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::IPFS_SCHEME;
use crate::error::ValidationError;

/// A content identifier without its scheme, e.g. `bafybeigdyr...`.
///
/// Addresses end up in gateway URL paths, so anything that could change the
/// path (`/`, `?`, `#`, whitespace) is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentAddress(String);

impl ContentAddress {
    /// Parse a bare CID or an `ipfs://<cid>` URI.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let prefix = format!("{}://", IPFS_SCHEME);
        let bare = trimmed.strip_prefix(prefix.as_str()).unwrap_or(trimmed);

        if bare.is_empty() {
            return Err(ValidationError::InvalidAddress(input.to_string()));
        }
        if bare
            .chars()
            .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace())
        {
            return Err(ValidationError::InvalidAddress(input.to_string()));
        }

        Ok(Self(bare.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn to_uri(&self) -> ContentUri {
        ContentUri(self.clone())
    }
}

impl Display for ContentAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentAddress> for String {
    fn from(address: ContentAddress) -> Self {
        address.0
    }
}

/// `ipfs://<address>`, the form handed to the on-chain registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentUri(ContentAddress);

impl ContentUri {
    pub fn address(&self) -> &ContentAddress {
        &self.0
    }

    pub fn into_address(self) -> ContentAddress {
        self.0
    }
}

impl From<ContentAddress> for ContentUri {
    fn from(address: ContentAddress) -> Self {
        Self(address)
    }
}

impl Display for ContentUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}://{}", IPFS_SCHEME, self.0)
    }
}

impl FromStr for ContentUri {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentAddress::parse(s).map(Self)
    }
}

impl TryFrom<String> for ContentUri {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentUri> for String {
    fn from(uri: ContentUri) -> Self {
        uri.to_string()
    }
}

//! Cloud KMS resource names
//!
//! The KMS resource hierarchy is project -> location -> key ring ->
//! crypto key -> crypto key version. Each level has a canonical specifier
//! of the form `projects/{p}/locations/{l}/keyRings/{r}/...`, and the
//! REST API addresses resources exclusively by specifier.

use std::fmt;

use crate::error::NameError;

/// `projects/{project}/locations/{location}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationName {
    pub project_id: String,
    pub location_id: String,
}

impl LocationName {
    pub fn new(project_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location_id: location_id.into(),
        }
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}",
            self.project_id, self.location_id
        )
    }
}

/// `projects/{project}/locations/{location}/keyRings/{key_ring}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRingName {
    pub project_id: String,
    pub location_id: String,
    pub key_ring_id: String,
}

impl KeyRingName {
    pub fn new(
        project_id: impl Into<String>,
        location_id: impl Into<String>,
        key_ring_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location_id: location_id.into(),
            key_ring_id: key_ring_id.into(),
        }
    }
}

impl fmt::Display for KeyRingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/keyRings/{}",
            self.project_id, self.location_id, self.key_ring_id
        )
    }
}

/// `.../keyRings/{key_ring}/cryptoKeys/{crypto_key}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoKeyName {
    pub project_id: String,
    pub location_id: String,
    pub key_ring_id: String,
    pub crypto_key_id: String,
}

impl CryptoKeyName {
    pub fn new(
        project_id: impl Into<String>,
        location_id: impl Into<String>,
        key_ring_id: impl Into<String>,
        crypto_key_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location_id: location_id.into(),
            key_ring_id: key_ring_id.into(),
            crypto_key_id: crypto_key_id.into(),
        }
    }
}

impl fmt::Display for CryptoKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/keyRings/{}/cryptoKeys/{}",
            self.project_id, self.location_id, self.key_ring_id, self.crypto_key_id
        )
    }
}

/// `.../cryptoKeys/{crypto_key}/cryptoKeyVersions/{version}`
///
/// Encrypt responses carry the producing version as a full specifier
/// string, so this name also parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoKeyVersionName {
    pub project_id: String,
    pub location_id: String,
    pub key_ring_id: String,
    pub crypto_key_id: String,
    pub version_id: String,
}

impl CryptoKeyVersionName {
    pub fn new(
        project_id: impl Into<String>,
        location_id: impl Into<String>,
        key_ring_id: impl Into<String>,
        crypto_key_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location_id: location_id.into(),
            key_ring_id: key_ring_id.into(),
            crypto_key_id: crypto_key_id.into(),
            version_id: version_id.into(),
        }
    }

    /// Parse a full version specifier.
    pub fn parse(specifier: &str) -> Result<Self, NameError> {
        let segments: Vec<&str> = specifier.split('/').collect();
        if segments.len() != 10 {
            return Err(NameError::Malformed(specifier.to_string()));
        }

        let collections = [segments[0], segments[2], segments[4], segments[6], segments[8]];
        if collections
            != [
                "projects",
                "locations",
                "keyRings",
                "cryptoKeys",
                "cryptoKeyVersions",
            ]
        {
            return Err(NameError::WrongCollection {
                name: specifier.to_string(),
                expected: "cryptoKeyVersions resource",
            });
        }

        if segments.iter().any(|s| s.is_empty()) {
            return Err(NameError::Malformed(specifier.to_string()));
        }

        Ok(Self::new(
            segments[1],
            segments[3],
            segments[5],
            segments[7],
            segments[9],
        ))
    }

    /// The parent crypto key of this version.
    pub fn crypto_key(&self) -> CryptoKeyName {
        CryptoKeyName::new(
            self.project_id.clone(),
            self.location_id.clone(),
            self.key_ring_id.clone(),
            self.crypto_key_id.clone(),
        )
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }
}

impl fmt::Display for CryptoKeyVersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/keyRings/{}/cryptoKeys/{}/cryptoKeyVersions/{}",
            self.project_id, self.location_id, self.key_ring_id, self.crypto_key_id, self.version_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specifier_formatting() {
        let name = CryptoKeyName::new("my-project", "global", "my-ring", "my-key");
        assert_eq!(
            name.to_string(),
            "projects/my-project/locations/global/keyRings/my-ring/cryptoKeys/my-key"
        );
    }

    #[test]
    fn test_version_name_round_trip() {
        let name = CryptoKeyVersionName::new("my-project", "global", "my-ring", "my-key", "3");
        let parsed = CryptoKeyVersionName::parse(&name.to_string()).unwrap();
        assert_eq!(parsed, name);
        assert_eq!(parsed.version_id(), "3");
        assert_eq!(parsed.crypto_key().crypto_key_id, "my-key");
    }

    #[test]
    fn test_parse_rejects_short_specifier() {
        let result = CryptoKeyVersionName::parse("projects/p/locations/global");
        assert!(matches!(result, Err(NameError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_collection() {
        let result = CryptoKeyVersionName::parse(
            "projects/p/locations/l/keyRings/r/importJobs/j/cryptoKeyVersions/1",
        );
        assert!(matches!(result, Err(NameError::WrongCollection { .. })));
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        let result = CryptoKeyVersionName::parse(
            "projects/p/locations/l/keyRings//cryptoKeys/k/cryptoKeyVersions/1",
        );
        assert!(result.is_err());
    }
}

use std::fmt;

use crate::error::RegistryError;

// Name and version stay separate fields so no character in either can make two
// identities collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    name: String,
    version: String,
}

impl ModelId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();
        let version = version.into();
        validate("name", &name)?;
        validate("version", &version)?;
        Ok(Self { name, version })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

// Log rendering only, never parsed back into an id.
impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

fn validate(field: &'static str, value: &str) -> Result<(), RegistryError> {
    let reason = if value.is_empty() {
        "must not be empty"
    } else if value.chars().any(char::is_control) {
        "must not contain control characters"
    } else {
        return Ok(());
    };
    Err(RegistryError::InvalidIdentity {
        field,
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_characters_do_not_collide() {
        let a = ModelId::new("a-b", "c").unwrap();
        let b = ModelId::new("a", "b-c").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "a-b@c");
    }

    #[test]
    fn rejects_malformed_fields() {
        for (name, version, field) in [
            ("", "1", "name"),
            ("resnet", "", "version"),
            ("resnet", "1\n", "version"),
            ("res\0net", "1", "name"),
        ] {
            match ModelId::new(name, version) {
                Err(RegistryError::InvalidIdentity { field: got, .. }) => assert_eq!(got, field),
                other => panic!("expected invalid identity for {name:?}/{version:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn accepts_surrounding_whitespace_as_distinct_identity() {
        let padded = ModelId::new(" resnet", "1 ").unwrap();
        let plain = ModelId::new("resnet", "1").unwrap();
        assert_ne!(padded, plain);
        assert_eq!(padded.name(), " resnet");
    }

    #[test]
    fn orders_by_name_then_version() {
        let mut ids = vec![
            ModelId::new("resnet", "2").unwrap(),
            ModelId::new("bert", "1").unwrap(),
            ModelId::new("resnet", "1").unwrap(),
        ];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["bert@1", "resnet@1", "resnet@2"]);
    }
}

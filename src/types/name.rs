// ABOUTME: DNS-label style validation for stack and container names.
// ABOUTME: Both feed into Docker resource names like `{stack}_{container}`.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("name cannot start or end with a separator")]
    EdgeSeparator,

    #[error("invalid character in name: '{0}'")]
    InvalidChar(char),
}

fn validate(value: &str) -> Result<(), NameError> {
    if value.is_empty() {
        return Err(NameError::Empty);
    }
    if value.len() > 63 {
        return Err(NameError::TooLong);
    }
    if value.starts_with(['-', '_']) || value.ends_with(['-', '_']) {
        return Err(NameError::EdgeSeparator);
    }
    for c in value.chars() {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '_' {
            return Err(NameError::InvalidChar(c));
        }
    }
    Ok(())
}

/// Name of the whole stack; namespaces every external Docker resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackName(String);

impl StackName {
    pub fn new(value: &str) -> Result<Self, NameError> {
        validate(value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a single container, unique within the stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, NameError> {
        validate(value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        assert!(StackName::new("myproject").is_ok());
        assert!(ContainerName::new("httpd").is_ok());
        assert!(ContainerName::new("my-db_2").is_ok());
    }

    #[test]
    fn rejects_empty_and_long() {
        assert!(matches!(StackName::new(""), Err(NameError::Empty)));
        let long = "a".repeat(64);
        assert!(matches!(StackName::new(&long), Err(NameError::TooLong)));
    }

    #[test]
    fn rejects_edge_separators_and_bad_chars() {
        assert!(matches!(
            ContainerName::new("-web"),
            Err(NameError::EdgeSeparator)
        ));
        assert!(matches!(
            ContainerName::new("web_"),
            Err(NameError::EdgeSeparator)
        ));
        assert!(matches!(
            ContainerName::new("Web"),
            Err(NameError::InvalidChar('W'))
        ));
        assert!(matches!(
            ContainerName::new("we b"),
            Err(NameError::InvalidChar(' '))
        ));
    }
}

//! Validated value types shared across the receta crates.
//!
//! Product labels, artifact file names and catalog names all pass through
//! [`NonEmptyText`] so that "present but blank" never reaches the document.

/// Errors raised while constructing validated text.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// Nothing but whitespace was supplied.
    #[error("text cannot be empty")]
    Empty,
}

/// Trimmed text holding at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it, failing with [`TextError::Empty`] when nothing remains.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`] but maps blank input to `None`.
    ///
    /// Optional free-text fields (notes, catalog codes) use this so that an empty
    /// form field and an absent one mean the same thing.
    pub fn optional(input: impl AsRef<str>) -> Option<Self> {
        Self::new(input).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  Jarabe de miel \n").unwrap();
        assert_eq!(text.as_str(), "Jarabe de miel");
    }

    #[test]
    fn test_new_rejects_blank_input() {
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(" \t\n"), Err(TextError::Empty));
    }

    #[test]
    fn test_optional_maps_blank_to_none() {
        assert!(NonEmptyText::optional("   ").is_none());
        assert_eq!(
            NonEmptyText::optional("tomar con agua").map(NonEmptyText::into_string),
            Some("tomar con agua".to_string())
        );
    }

    #[test]
    fn test_deserialize_rejects_blank_string() {
        let ok: NonEmptyText = serde_yaml::from_str("\"A12 - Tonico\"").unwrap();
        assert_eq!(ok.as_str(), "A12 - Tonico");

        let err = serde_yaml::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
    }
}

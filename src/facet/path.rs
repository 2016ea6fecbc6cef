use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SifterError};

/// Hierarchical facet label: a dimension plus path components
///
/// Rendered as `dim/c1/c2`. A path without components names the dimension
/// itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FacetPath {
    dimension: String,
    components: Vec<String>,
}

impl FacetPath {
    pub fn new<I, S>(dimension: impl Into<String>, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimension: dimension.into(),
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// Path naming only the dimension
    pub fn dimension_root(dimension: impl Into<String>) -> Self {
        Self::new(dimension, std::iter::empty::<String>())
    }

    /// Parse `dim/c1/c2`
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split('/');
        let dimension = parts.next().unwrap_or_default();
        let path = Self::new(dimension, parts);
        path.validate()?;
        Ok(path)
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of components below the dimension
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Last component, or the dimension for a dimension path
    pub fn label(&self) -> &str {
        self.components.last().unwrap_or(&self.dimension)
    }

    /// Enclosing path; `None` for a dimension path
    pub fn parent(&self) -> Option<FacetPath> {
        let (_, rest) = self.components.split_last()?;
        Some(Self {
            dimension: self.dimension.clone(),
            components: rest.to_vec(),
        })
    }

    /// The path extended by one component
    pub fn child(&self, component: impl Into<String>) -> FacetPath {
        let mut components = self.components.clone();
        components.push(component.into());
        Self {
            dimension: self.dimension.clone(),
            components,
        }
    }

    /// The dimension path followed by every prefix down to `self`
    pub fn prefixes(&self) -> impl Iterator<Item = FacetPath> + '_ {
        (0..=self.components.len()).map(move |len| Self {
            dimension: self.dimension.clone(),
            components: self.components[..len].to_vec(),
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.dimension.is_empty() {
            return Err(SifterError::InvalidFacet(format!(
                "empty dimension in '{}'",
                self
            )));
        }
        if self.components.iter().any(|c| c.is_empty()) {
            return Err(SifterError::InvalidFacet(format!(
                "empty path component in '{}'",
                self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FacetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dimension)?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = FacetPath::parse("category/books/rust").unwrap();
        assert_eq!(path.dimension(), "category");
        assert_eq!(path.components(), ["books", "rust"]);
        assert_eq!(path.to_string(), "category/books/rust");
        assert_eq!(path.label(), "rust");

        assert!(FacetPath::parse("").is_err());
        assert!(FacetPath::parse("category//x").is_err());
    }

    #[test]
    fn test_parent_and_prefixes() {
        let path = FacetPath::new("category", ["a", "b"]);
        assert_eq!(path.parent(), Some(FacetPath::new("category", ["a"])));
        assert_eq!(FacetPath::dimension_root("category").parent(), None);

        let prefixes: Vec<String> = path.prefixes().map(|p| p.to_string()).collect();
        assert_eq!(prefixes, vec!["category", "category/a", "category/a/b"]);
        assert_eq!(
            FacetPath::dimension_root("category").child("a"),
            FacetPath::new("category", ["a"])
        );
    }
}

use serde::{Deserialize, Serialize};

use crate::facet::FacetPath;
use crate::segment::Ordinal;

/// A single (name, value) pair of a document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    /// Whether the value is analyzed into the inverted index
    pub indexed: bool,
}

impl Field {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            indexed: true,
        }
    }

    pub fn stored(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            indexed: false,
        }
    }
}

/// Document handed to the writer
///
/// Fields keep their insertion order. Facet labels are attached with
/// [`Document::with_facet`] and must be resolved into taxonomy ordinals by
/// [`crate::facet::FacetsConfig::build`] before indexing.
#[derive(Clone, Debug, Default)]
pub struct Document {
    fields: Vec<Field>,
    facets: Vec<FacetPath>,
    facet_ordinals: Option<Vec<Ordinal>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an indexed and stored field
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::text(name, value));
        self
    }

    /// Add a stored-only field
    pub fn with_stored(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::stored(name, value));
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Attach a facet label such as `("category", ["c1"])`
    pub fn with_facet<I, S>(mut self, dimension: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets.push(FacetPath::new(dimension, path));
        self
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn add_facet(&mut self, path: FacetPath) {
        self.facets.push(path);
        self.facet_ordinals = None;
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn facets(&self) -> &[FacetPath] {
        &self.facets
    }

    /// Resolved taxonomy ordinals, `None` until the facets are built
    pub fn facet_ordinals(&self) -> Option<&[Ordinal]> {
        self.facet_ordinals.as_deref()
    }

    pub(crate) fn set_facet_ordinals(&mut self, ordinals: Vec<Ordinal>) {
        self.facet_ordinals = Some(ordinals);
    }

    pub(crate) fn into_parts(self) -> (Vec<Field>, Vec<FacetPath>, Option<Vec<Ordinal>>) {
        (self.fields, self.facets, self.facet_ordinals)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.facets.is_empty()
    }
}

/// Stored copy of an indexed document as returned by readers
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub fields: Vec<Field>,
}

impl StoredDocument {
    /// First value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Every value of a field, in insertion order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

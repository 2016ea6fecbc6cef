use std::collections::HashMap;

use super::path::FacetPath;
use super::taxonomy::{TaxonomyWriter, ROOT_ORDINAL};
use crate::error::{Result, SifterError};
use crate::models::Document;
use crate::segment::Ordinal;

/// Per-dimension facet options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DimConfig {
    /// Labels may have more than one path component
    pub hierarchical: bool,
    /// A document may carry several labels of the dimension
    pub multi_valued: bool,
}

/// Facet options by dimension and label resolution for documents
#[derive(Clone, Debug, Default)]
pub struct FacetsConfig {
    dims: HashMap<String, DimConfig>,
}

impl FacetsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hierarchical(&mut self, dim: impl Into<String>, hierarchical: bool) {
        self.dims.entry(dim.into()).or_default().hierarchical = hierarchical;
    }

    pub fn set_multi_valued(&mut self, dim: impl Into<String>, multi_valued: bool) {
        self.dims.entry(dim.into()).or_default().multi_valued = multi_valued;
    }

    /// Options of `dim`, defaults for unconfigured dimensions
    pub fn dim_config(&self, dim: &str) -> DimConfig {
        self.dims.get(dim).copied().unwrap_or_default()
    }

    /// Resolve the document's facet labels into taxonomy ordinals
    ///
    /// Each label contributes its own ordinal and those of all its ancestors
    /// below the root. The result is sorted and free of duplicates.
    pub fn build(&self, taxonomy: &TaxonomyWriter, mut doc: Document) -> Result<Document> {
        let mut per_dim: HashMap<&str, Vec<&FacetPath>> = HashMap::new();
        for path in doc.facets() {
            path.validate()?;
            if path.depth() == 0 {
                return Err(SifterError::InvalidFacet(format!(
                    "facet '{}' has no label below the dimension",
                    path
                )));
            }
            let config = self.dim_config(path.dimension());
            if !config.hierarchical && path.depth() > 1 {
                return Err(SifterError::InvalidFacet(format!(
                    "dimension '{}' is not hierarchical but got '{}'",
                    path.dimension(),
                    path
                )));
            }
            let labels = per_dim.entry(path.dimension()).or_default();
            if !labels.contains(&path) {
                labels.push(path);
            }
        }

        for (dim, labels) in &per_dim {
            if labels.len() > 1 && !self.dim_config(dim).multi_valued {
                return Err(SifterError::InvalidFacet(format!(
                    "dimension '{}' is not multi-valued but got {} labels",
                    dim,
                    labels.len()
                )));
            }
        }

        let mut ordinals: Vec<Ordinal> = Vec::new();
        for path in doc.facets() {
            let mut ordinal = taxonomy.add_path(path)?;
            while ordinal != ROOT_ORDINAL {
                ordinals.push(ordinal);
                ordinal = taxonomy.parent(ordinal).unwrap_or(ROOT_ORDINAL);
            }
        }
        ordinals.sort_unstable();
        ordinals.dedup();

        doc.set_facet_ordinals(ordinals);
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_resolves_ancestors() {
        let taxonomy = TaxonomyWriter::in_memory();
        let mut config = FacetsConfig::new();
        config.set_hierarchical("category", true);
        config.set_multi_valued("category", true);

        let doc = Document::new()
            .with_facet("category", ["books", "rust"])
            .with_facet("category", ["books", "go"]);
        let doc = config.build(&taxonomy, doc).unwrap();

        // category=1, books=2, rust=3, go=4
        assert_eq!(doc.facet_ordinals(), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn test_flat_dimension_rejects_paths() {
        let taxonomy = TaxonomyWriter::in_memory();
        let config = FacetsConfig::new();

        let doc = Document::new().with_facet("category", ["a", "b"]);
        let err = config.build(&taxonomy, doc).unwrap_err();
        assert!(matches!(err, SifterError::InvalidFacet(_)));
    }

    #[test]
    fn test_single_valued_dimension_rejects_many_labels() {
        let taxonomy = TaxonomyWriter::in_memory();
        let config = FacetsConfig::new();

        let doc = Document::new()
            .with_facet("category", ["c1"])
            .with_facet("category", ["c2"]);
        assert!(matches!(
            config.build(&taxonomy, doc),
            Err(SifterError::InvalidFacet(_))
        ));

        // Repeating the same label is fine
        let doc = Document::new()
            .with_facet("category", ["c1"])
            .with_facet("category", ["c1"]);
        let doc = config.build(&taxonomy, doc).unwrap();
        assert_eq!(doc.facet_ordinals().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_dimension_without_label_rejected() {
        let taxonomy = TaxonomyWriter::in_memory();
        let doc = Document::new().with_facet("category", Vec::<String>::new());
        assert!(FacetsConfig::new().build(&taxonomy, doc).is_err());
    }
}

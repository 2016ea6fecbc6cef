use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sifter::{
    Document, EngineVersion, FacetCounts, FacetPath, FacetsConfig, GroupingSearch, IndexSearcher,
    IndexSettings, IndexStore, Query, QueryParser, TaxonomyReader, TaxonomyWriter,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Stored field holding the source path of indexed files
const PATH_FIELD: &str = "path";

#[derive(Parser)]
#[command(name = "sifter")]
#[command(about = "Embeddable full-text index with grouping and facets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct StoreArgs {
    /// Index directory
    #[arg(long, env = "SIFTER_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// JSON file with index settings
    #[arg(long, env = "SIFTER_CONFIG")]
    config: Option<PathBuf>,
}

impl StoreArgs {
    fn open(&self) -> Result<Arc<IndexStore>> {
        let settings = match &self.config {
            Some(path) => IndexSettings::from_json_file(path)
                .with_context(|| format!("reading settings from {}", path.display()))?,
            None => IndexSettings::default(),
        };
        IndexStore::open(&self.data_dir, settings)
            .with_context(|| format!("opening index at {}", self.data_dir.display()))
    }
}

#[derive(Args)]
struct TaxonomyArgs {
    /// Taxonomy directory for facet labels
    #[arg(long, env = "SIFTER_TAXONOMY_DIR", default_value = "./taxonomy")]
    taxonomy_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Index files, one document per file, and commit once
    Index {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        taxonomy: TaxonomyArgs,

        /// Field receiving each file's text
        #[arg(long, default_value = "body")]
        field: String,

        /// Facet label added to every document, as `dim/a/b`; repeatable
        #[arg(long = "facet")]
        facets: Vec<String>,

        /// Files to index; standard input when empty
        files: Vec<PathBuf>,
    },

    /// Run a query and print the best hits
    Search {
        #[command(flatten)]
        store: StoreArgs,

        /// Field for terms written without `field:`
        #[arg(long, env = "SIFTER_DEFAULT_FIELD")]
        default_field: Option<String>,

        #[arg(long, default_value = "10")]
        limit: usize,

        query: String,
    },

    /// List the terms of a field with document frequencies
    Terms {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long)]
        field: String,
    },

    /// Group the matches of a query by a stored field
    Group {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long)]
        field: String,

        #[arg(long, env = "SIFTER_DEFAULT_FIELD")]
        default_field: Option<String>,

        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(long, default_value = "10")]
        limit: usize,

        /// Query selecting the documents to group; all documents when absent
        query: Option<String>,
    },

    /// Count facet labels under a dimension for the matches of a query
    Facets {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        taxonomy: TaxonomyArgs,

        /// Dimension, optionally with a path below it: `dim` or `dim/a`
        #[arg(long)]
        dim: String,

        #[arg(long, env = "SIFTER_DEFAULT_FIELD")]
        default_field: Option<String>,

        #[arg(long, default_value = "10")]
        top_n: usize,

        /// Query selecting the documents to count; all documents when absent
        query: Option<String>,
    },

    /// Print implementation and index format versions
    Version,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Index {
            store,
            taxonomy,
            field,
            facets,
            files,
        } => index(&store, &taxonomy, &field, &facets, &files),
        Command::Search {
            store,
            default_field,
            limit,
            query,
        } => search(&store, default_field, limit, &query),
        Command::Terms { store, field } => terms(&store, &field),
        Command::Group {
            store,
            field,
            default_field,
            offset,
            limit,
            query,
        } => group(&store, &field, default_field, offset, limit, query.as_deref()),
        Command::Facets {
            store,
            taxonomy,
            dim,
            default_field,
            top_n,
            query,
        } => facets(&store, &taxonomy, &dim, default_field, top_n, query.as_deref()),
        Command::Version => {
            println!("{}", EngineVersion::current());
            Ok(())
        }
    }
}

fn index(
    args: &StoreArgs,
    taxonomy_args: &TaxonomyArgs,
    field: &str,
    facets: &[String],
    files: &[PathBuf],
) -> Result<()> {
    let labels = facets
        .iter()
        .map(|label| FacetPath::parse(label).with_context(|| format!("facet '{}'", label)))
        .collect::<Result<Vec<_>>>()?;
    let mut config = FacetsConfig::new();
    for label in &labels {
        config.set_hierarchical(label.dimension(), true);
        config.set_multi_valued(label.dimension(), true);
    }
    let taxonomy = if labels.is_empty() {
        None
    } else {
        Some(TaxonomyWriter::open(&taxonomy_args.taxonomy_dir)?)
    };

    let store = args.open()?;
    let writer = store.writer()?;
    let prepare = |mut doc: Document| -> Result<Document> {
        match &taxonomy {
            Some(taxonomy) => {
                for label in &labels {
                    doc.add_facet(label.clone());
                }
                Ok(config.build(taxonomy, doc)?)
            }
            None => Ok(doc),
        }
    };

    if files.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        writer.add_document(prepare(Document::new().with_text(field, text))?)?;
    }
    for path in files {
        let text = read_file(path)?;
        writer.add_document(prepare(
            Document::new()
                .with_text(field, text)
                .with_stored(PATH_FIELD, path.display().to_string()),
        )?)?;
    }

    // Labels first, so committed documents never reference unknown ordinals
    if let Some(taxonomy) = taxonomy {
        taxonomy.close()?;
    }
    let pending = writer.pending_docs();
    let generation = writer.commit()?;
    info!("Indexed {} documents, generation {}", pending, generation);
    println!("indexed {} documents (generation {})", pending, generation);
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn parse_query(input: &str, default_field: Option<String>) -> Result<Query> {
    let mut parser = QueryParser::new();
    if let Some(field) = default_field {
        parser = parser.with_default_field(field);
    }
    Ok(parser.parse(input)?)
}

fn search(args: &StoreArgs, default_field: Option<String>, limit: usize, input: &str) -> Result<()> {
    let query = parse_query(input, default_field)?;
    let store = args.open()?;
    let searcher = IndexSearcher::new(store.reader()?);

    let top = searcher.search(&query, limit)?;
    println!("{} hits", top.total_hits);
    for hit in &top.score_docs {
        let path = searcher
            .doc(hit.doc)?
            .and_then(|d| d.get(PATH_FIELD).map(str::to_string))
            .unwrap_or_default();
        println!("{}\t{:.4}\t{}", hit.doc.as_u32(), hit.score, path);
    }
    Ok(())
}

fn terms(args: &StoreArgs, field: &str) -> Result<()> {
    let store = args.open()?;
    let reader = store.reader()?;
    for info in reader.terms(field)? {
        println!("{}\t{}", info.term, info.doc_freq);
    }
    Ok(())
}

fn group(
    args: &StoreArgs,
    field: &str,
    default_field: Option<String>,
    offset: usize,
    limit: usize,
    input: Option<&str>,
) -> Result<()> {
    let query = match input {
        Some(input) => parse_query(input, default_field)?,
        None => Query::match_all(),
    };
    let store = args.open()?;
    let searcher = IndexSearcher::new(store.reader()?);

    let top = GroupingSearch::new(field).search(&searcher, &query, offset, limit)?;
    println!(
        "{} hits in {} groups",
        top.total_hit_count, top.total_group_count
    );
    for group in &top.groups {
        println!(
            "{}\t{}\t{:.4}",
            group.group_value.as_deref().unwrap_or("<none>"),
            group.total_hits,
            group.max_score
        );
    }
    Ok(())
}

fn facets(
    args: &StoreArgs,
    taxonomy_args: &TaxonomyArgs,
    dim: &str,
    default_field: Option<String>,
    top_n: usize,
    input: Option<&str>,
) -> Result<()> {
    let query = match input {
        Some(input) => parse_query(input, default_field)?,
        None => Query::match_all(),
    };
    let path = FacetPath::parse(dim).with_context(|| format!("dimension '{}'", dim))?;
    let store = args.open()?;
    let searcher = IndexSearcher::new(store.reader()?);
    let taxonomy = TaxonomyReader::open_dir(&taxonomy_args.taxonomy_dir)?;

    let matches = searcher.collect(&query)?;
    let counts = FacetCounts::new(&taxonomy, &searcher, &matches)?;
    let components: Vec<&str> = path.components().iter().map(String::as_str).collect();
    match counts.top_children(top_n, path.dimension(), &components) {
        Some(result) => {
            println!(
                "{}\t{}\t{} children",
                path, result.value, result.child_count
            );
            for lv in &result.label_values {
                println!("{}\t{}", lv.label, lv.value);
            }
        }
        None => println!("no counts for '{}'", path),
    }
    Ok(())
}

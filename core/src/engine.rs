use crate::builder;
use crate::corpus::read_corpus;
use crate::error::{BuildError, SearchError};
use crate::persist::{load_segment, save_segment, segment_exists, IndexPaths};
use crate::query::QueryParser;
use crate::scoring::ScoringMode;
use crate::search::{self, ScoredDocument};
use crate::store::IndexStore;
use crate::tokenizer::Analyzer;
use crate::RawDocument;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Startup parameters handed in by the process layer.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Corpus to index when rebuilding at startup.
    pub corpus_path: Option<PathBuf>,
    /// Where the segment is persisted. `None` keeps the index in memory only.
    pub index_dir: Option<PathBuf>,
    /// Rebuild from `corpus_path` instead of reopening the persisted segment.
    pub rebuild_on_startup: bool,
    pub analyzer: Analyzer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSummary {
    pub documents: u32,
    pub terms: usize,
    pub average_document_length: f64,
    pub took_s: f64,
}

/// The two operations exposed to the outside: rebuild the index, and search it.
pub struct SearchEngine {
    store: IndexStore,
    paths: Option<IndexPaths>,
    analyzer: Analyzer,
}

impl SearchEngine {
    /// An engine with no index yet; searches fail until a build succeeds.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            store: IndexStore::new(),
            paths: config.index_dir.as_ref().map(IndexPaths::new),
            analyzer: config.analyzer,
        }
    }

    /// Bring an engine up as configured: rebuild from the corpus, or reopen
    /// the persisted segment when there is one.
    ///
    /// A failed startup rebuild falls back to the persisted segment if one
    /// exists, and only fails when there is nothing to serve.
    pub fn start(config: &EngineConfig) -> Result<Self, BuildError> {
        let engine = Self::new(config);
        let persisted = engine.paths.clone().filter(segment_exists);
        if config.rebuild_on_startup {
            match engine.rebuild_from(config.corpus_path.as_deref()) {
                Ok(summary) => {
                    tracing::info!(documents = summary.documents, "index rebuilt at startup");
                    return Ok(engine);
                }
                Err(e) => match &persisted {
                    Some(paths) => {
                        tracing::error!(
                            error = %e,
                            "startup rebuild failed, serving persisted segment"
                        );
                        engine.store.install(load_segment(paths)?);
                    }
                    None => return Err(e),
                },
            }
        } else if let Some(paths) = &persisted {
            engine.store.install(load_segment(paths)?);
        } else {
            tracing::warn!("no persisted index found; waiting for a build");
        }
        Ok(engine)
    }

    fn rebuild_from(&self, corpus: Option<&Path>) -> Result<BuildSummary, BuildError> {
        let corpus = corpus.ok_or_else(|| {
            BuildError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "rebuild requested without a corpus path",
            ))
        })?;
        self.build_index(read_corpus(corpus)?)
    }

    pub fn store(&self) -> &IndexStore { &self.store }

    /// Build a new segment from `documents` and make it the active one.
    ///
    /// Only one build runs at a time. On any error the active segment, both
    /// in memory and on disk, is left as it was.
    pub fn build_index<I>(&self, documents: I) -> Result<BuildSummary, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<RawDocument>,
    {
        let _guard = self.store.lock_build();
        let start = Instant::now();
        let segment = builder::build(self.analyzer, documents)?.merge();
        if let Some(paths) = &self.paths {
            save_segment(paths, &segment)?;
        }
        let summary = BuildSummary {
            documents: segment.document_count(),
            terms: segment.term_count(),
            average_document_length: segment.average_document_length(),
            took_s: start.elapsed().as_secs_f64(),
        };
        self.store.install(segment);
        tracing::info!(
            documents = summary.documents,
            terms = summary.terms,
            took_s = summary.took_s,
            "index build complete"
        );
        Ok(summary)
    }

    /// Ranked document ids for `query`.
    pub fn search(
        &self,
        mode: ScoringMode,
        top_k: usize,
        query: &str,
    ) -> Result<Vec<String>, SearchError> {
        Ok(self.search_scored(mode, top_k, query)?.into_iter().map(|d| d.id).collect())
    }

    pub fn search_scored(
        &self,
        mode: ScoringMode,
        top_k: usize,
        query: &str,
    ) -> Result<Vec<ScoredDocument>, SearchError> {
        if top_k == 0 {
            return Err(SearchError::InvalidArgument("top_k must be at least 1".into()));
        }
        let segment = self.store.snapshot()?;
        let parsed = QueryParser::new(*segment.analyzer()).parse(query)?;
        search::search(&segment, &parsed, mode, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use tempfile::tempdir;

    fn persisted_config(dir: &Path) -> EngineConfig {
        EngineConfig { index_dir: Some(dir.to_path_buf()), ..Default::default() }
    }

    #[test]
    fn search_before_build_is_unavailable() {
        let engine = SearchEngine::new(&EngineConfig::default());
        assert_eq!(engine.search(ScoringMode::Bm25, 3, "cat"), Err(SearchError::IndexUnavailable));
    }

    #[test]
    fn argument_checks_come_first() {
        let engine = SearchEngine::new(&EngineConfig::default());
        let err = engine.search(ScoringMode::TfIdf, 0, "cat").unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[test]
    fn failed_build_keeps_previous_index() {
        let engine = SearchEngine::new(&EngineConfig::default());
        engine.build_index(vec![Document::new("d1", "cat")]).unwrap();
        let bad = vec![RawDocument { id: Some("d2".into()), text: None }];
        assert!(engine.build_index(bad).is_err());
        assert_eq!(engine.search(ScoringMode::Bm25, 5, "cat").unwrap(), vec!["d1"]);
    }

    #[test]
    fn start_reopens_persisted_segment() {
        let dir = tempdir().unwrap();
        let config = persisted_config(dir.path());
        let engine = SearchEngine::start(&config).unwrap();
        assert!(!engine.store().is_ready());
        engine.build_index(vec![Document::new("d1", "persisted words")]).unwrap();

        let reopened = SearchEngine::start(&config).unwrap();
        assert_eq!(reopened.search(ScoringMode::Bm25, 1, "words").unwrap(), vec!["d1"]);
        assert_eq!(
            *reopened.store().snapshot().unwrap(),
            *engine.store().snapshot().unwrap()
        );
    }

    #[test]
    fn start_rebuilds_from_corpus() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("corpus.jsonl");
        std::fs::write(&corpus, "{\"id\":\"x\",\"text\":\"rebuilt\"}\n").unwrap();
        let config = EngineConfig {
            corpus_path: Some(corpus),
            index_dir: Some(dir.path().join("index")),
            rebuild_on_startup: true,
            ..Default::default()
        };
        let engine = SearchEngine::start(&config).unwrap();
        assert!(engine.search(ScoringMode::TfIdf, 1, "rebuilt").unwrap().is_empty());
        assert_eq!(engine.search(ScoringMode::Bm25, 1, "rebuilt").unwrap(), vec!["x"]);
    }

    #[test]
    fn failed_startup_rebuild_serves_persisted_segment() {
        let dir = tempdir().unwrap();
        let index_dir = dir.path().join("index");
        SearchEngine::new(&persisted_config(&index_dir))
            .build_index(vec![Document::new("kept", "survivor")])
            .unwrap();

        let corpus = dir.path().join("broken.jsonl");
        std::fs::write(&corpus, "{\"text\":\"no id here\"}\n").unwrap();
        let config = EngineConfig {
            corpus_path: Some(corpus),
            rebuild_on_startup: true,
            ..persisted_config(&index_dir)
        };
        let engine = SearchEngine::start(&config).unwrap();
        assert_eq!(engine.search(ScoringMode::Bm25, 3, "survivor").unwrap(), vec!["kept"]);
    }

    #[test]
    fn failed_startup_rebuild_without_fallback_is_an_error() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("broken.jsonl");
        std::fs::write(&corpus, "{\"text\":\"no id here\"}\n").unwrap();
        let config = EngineConfig {
            corpus_path: Some(corpus),
            rebuild_on_startup: true,
            ..persisted_config(&dir.path().join("index"))
        };
        let err = SearchEngine::start(&config).err().unwrap();
        assert!(matches!(err, BuildError::MalformedDocument { position: 0, .. }));
    }

    #[test]
    fn start_recovers_segment_left_by_interrupted_swap() {
        let dir = tempdir().unwrap();
        let config = persisted_config(dir.path());
        let docs = vec![Document::new("d1", "stranded words")];
        SearchEngine::new(&config).build_index(docs).unwrap();
        std::fs::rename(dir.path().join("segment"), dir.path().join("segment.old")).unwrap();

        let reopened = SearchEngine::start(&config).unwrap();
        assert_eq!(reopened.search(ScoringMode::Bm25, 1, "stranded").unwrap(), vec!["d1"]);
    }
}

//! Ingestion pipeline
//!
//! Batch job that atomizes course documents and replaces their stored
//! node sets. One container at a time; a malformed filename or empty
//! atomization skips that container and the batch continues. The
//! summary groups failures by cause for operator triage.

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::alias::AliasExtractor;
use crate::content::atomizer::{Atomizer, DocumentMeta};
use crate::content::types::{ContainerType, ContentContainer, ContentNode};
use crate::errors::{CoachError, Result};
use crate::store::ContentStore;

/// Ingestion entry-point options
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub course_id: String,
    /// Only process documents for this day
    pub day_filter: Option<u32>,
    /// Atomize and report without touching the store
    pub dry_run: bool,
}

/// Why a document was not ingested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    pub file: String,
    pub cause: String,
}

/// Batch outcome for operator triage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSummary {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub nodes_written: usize,
    pub dry_run: bool,
    pub failures: Vec<IngestFailure>,
}

impl IngestSummary {
    /// Failures grouped by cause, causes sorted for stable reporting
    pub fn failures_by_cause(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for failure in &self.failures {
            grouped
                .entry(failure.cause.clone())
                .or_default()
                .push(failure.file.clone());
        }
        grouped
    }
}

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^day(\d+)_(chapter|lab)(\d+)_(.+)\.md$").unwrap())
}

/// Parsed identity of one source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub day: u32,
    pub container_type: ContainerType,
    pub container_seq: u32,
    pub title: String,
}

/// Parse `day<NN>_<chapter|lab><NN>_<title>.md` into container metadata.
pub fn parse_filename(name: &str) -> Result<ParsedFilename> {
    let caps = filename_re()
        .captures(name)
        .ok_or_else(|| CoachError::UnrecognizedFilename(name.to_string()))?;

    let day: u32 = caps[1]
        .parse()
        .map_err(|_| CoachError::UnrecognizedFilename(name.to_string()))?;
    let container_type = match &caps[2] {
        "chapter" => ContainerType::Chapter,
        _ => ContainerType::Lab,
    };
    let container_seq: u32 = caps[3]
        .parse()
        .map_err(|_| CoachError::UnrecognizedFilename(name.to_string()))?;
    if day == 0 || container_seq == 0 {
        return Err(CoachError::UnrecognizedFilename(name.to_string()));
    }

    let title = caps[4]
        .split('_')
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(ParsedFilename {
        day,
        container_type,
        container_seq,
        title,
    })
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Offline batch pipeline: atomize, enrich, replace per container
pub struct IngestPipeline {
    atomizer: Atomizer,
    aliases: AliasExtractor,
    store: Arc<dyn ContentStore>,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn ContentStore>, aliases: AliasExtractor) -> Self {
        Self {
            atomizer: Atomizer::new(),
            aliases,
            store,
        }
    }

    /// Ingest every matching document under `dir`.
    pub async fn ingest_dir(&self, dir: &Path, options: &IngestOptions) -> Result<IngestSummary> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().map(|e| e == "md").unwrap_or(false))
            .collect();
        files.sort();

        let mut summary = IngestSummary {
            dry_run: options.dry_run,
            ..Default::default()
        };

        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            let parsed = match parse_filename(&name) {
                Ok(parsed) => parsed,
                Err(err) => {
                    summary.skipped += 1;
                    summary.failures.push(IngestFailure {
                        file: name,
                        cause: cause_of(&err),
                    });
                    continue;
                }
            };

            if let Some(day) = options.day_filter {
                if parsed.day != day {
                    summary.skipped += 1;
                    continue;
                }
            }

            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    summary.failed += 1;
                    summary.failures.push(IngestFailure {
                        file: name,
                        cause: format!("unreadable file: {}", err),
                    });
                    continue;
                }
            };

            match self.ingest_document(&text, &name, &parsed, options).await {
                Ok(node_count) => {
                    summary.processed += 1;
                    summary.nodes_written += node_count;
                }
                Err(err) => {
                    summary.failed += 1;
                    summary.failures.push(IngestFailure {
                        file: name,
                        cause: cause_of(&err),
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Atomize one document and replace its container in the store.
    ///
    /// Alias generation failures degrade per node; they never abort the
    /// container.
    pub async fn ingest_document(
        &self,
        text: &str,
        filename: &str,
        parsed: &ParsedFilename,
        options: &IngestOptions,
    ) -> Result<usize> {
        let container_id = filename.trim_end_matches(".md").to_string();
        let meta = DocumentMeta {
            course_id: options.course_id.clone(),
            day: parsed.day,
            container_type: parsed.container_type,
            container_seq: parsed.container_seq,
            container_id: container_id.clone(),
            title: parsed.title.clone(),
        };

        let mut nodes = self.atomizer.atomize(text, &meta)?;
        self.enrich_aliases(&mut nodes).await;
        let node_count = nodes.len();

        if options.dry_run {
            return Ok(node_count);
        }

        let container = ContentContainer {
            course_id: options.course_id.clone(),
            container_type: parsed.container_type,
            container_id,
            day: parsed.day,
            sequence: parsed.container_seq,
            title: parsed.title.clone(),
            node_count,
            ingested_at: Utc::now(),
        };

        self.store.replace_container(container, nodes).await?;
        Ok(node_count)
    }

    async fn enrich_aliases(&self, nodes: &mut [ContentNode]) {
        for node in nodes.iter_mut() {
            let topic = match node.primary_topic.clone() {
                Some(topic) => topic,
                None => continue,
            };
            let definition: String = node.text.chars().take(200).collect();
            let aliases = self
                .aliases
                .generate_aliases(&topic, &definition, node.node_type)
                .await;
            if !aliases.is_empty() {
                node.aliases = Some(aliases);
            }
        }
    }
}

fn cause_of(err: &CoachError) -> String {
    match err {
        CoachError::UnrecognizedFilename(_) => "unrecognized filename pattern".to_string(),
        CoachError::EmptyAtomization(_) => "document atomized to zero nodes".to_string(),
        CoachError::StoreError(_) => "content store failure".to_string(),
        other => other.to_string(),
    }
}

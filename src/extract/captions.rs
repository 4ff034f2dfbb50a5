//! Caption extraction across representations.
//!
//! Each captioned representation gets its own [`CaptionParser`] and is
//! decoded on a worker task; the number of representations in flight is
//! bounded by the configured concurrency. Inside a representation the
//! segments are decoded strictly in order because decoder state carries
//! over from one segment to the next.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use mediacheck_captions::{CaptionError, CaptionParser};
use mediacheck_common::{stream_languages, CeaScheme, Cue};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{Config, RepresentationConfig};

/// Cues of one caption stream in one representation.
#[derive(Debug, Clone, Serialize)]
pub struct CaptionStream {
    /// Stream label (`CC1`, `svc1`, ...)
    pub stream: String,
    pub representation: String,
    pub cues: Vec<Cue>,
}

/// Caption streams keyed by `{stream}_{representation}`.
pub type Captions = BTreeMap<String, CaptionStream>;

/// A cue present in one representation of a stream but not another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCue {
    pub stream: String,
    pub cue_id: String,
    pub present_in: String,
    pub missing_from: String,
}

/// Per-representation extraction outcome.
#[derive(Debug, Default)]
pub struct RepresentationCaptions {
    pub representation: String,
    pub streams: BTreeMap<String, Vec<Cue>>,
    pub segments_decoded: usize,
    pub segments_skipped: usize,
}

/// Resolve the caption scheme of a representation.
pub fn resolve_scheme(
    representation: &str,
    value: Option<&str>,
) -> std::result::Result<CeaScheme, CaptionError> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| CaptionError::MissingScheme(representation.to_string()))
}

/// Key under which a representation's stream is aggregated and written.
pub fn stream_key(stream: &str, representation: &str) -> String {
    format!("{}_{}", stream, representation.replace('/', "-"))
}

/// Decode the captions of every captioned representation in the job.
pub async fn extract_captions(config: &Config) -> Result<Captions> {
    let semaphore = Arc::new(Semaphore::new(config.limits.concurrency));
    let timeout = Duration::from_secs(config.limits.segment_timeout_secs);
    let mut tasks = JoinSet::new();

    for rep in config.representations.iter().filter(|r| r.captions.is_some()) {
        let scheme = resolve_scheme(&rep.id, rep.captions.as_deref())?;
        let rep = rep.clone();
        let sem = semaphore.clone();
        tasks.spawn(async move {
            let _permit = sem.acquire_owned().await?;
            decode_representation(&rep, scheme, timeout).await
        });
    }

    let mut captions = Captions::new();
    while let Some(joined) = tasks.join_next().await {
        let decoded = match joined.context("Caption task panicked")? {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::error!("Caption extraction failed: {:#}", e);
                continue;
            }
        };
        tracing::info!(
            "Representation {}: {} segments decoded, {} skipped",
            decoded.representation,
            decoded.segments_decoded,
            decoded.segments_skipped
        );
        for (stream, cues) in decoded.streams {
            captions.insert(
                stream_key(&stream, &decoded.representation),
                CaptionStream {
                    stream,
                    representation: decoded.representation.clone(),
                    cues,
                },
            );
        }
    }

    Ok(captions)
}

/// Decode one representation's segments in order.
///
/// The init segment is parsed again whenever the period changes. A segment
/// that cannot be read, fails to decode or exceeds `timeout` contributes no
/// cues; decoder state is kept for the segments after it.
pub async fn decode_representation(
    rep: &RepresentationConfig,
    scheme: CeaScheme,
    timeout: Duration,
) -> Result<RepresentationCaptions> {
    let init: Arc<[u8]> = tokio::fs::read(&rep.init)
        .await
        .with_context(|| format!("Failed to read init segment: {:?}", rep.init))?
        .into();
    let parser = Arc::new(Mutex::new(CaptionParser::new(scheme)));
    let mut result = RepresentationCaptions {
        representation: rep.id.clone(),
        ..Default::default()
    };
    let mut current_period: Option<String> = None;

    for (idx, segment) in rep.segments.iter().enumerate() {
        let period = segment.period.clone();
        if current_period.as_ref() != Some(&period) {
            let parser = parser.clone();
            let init = init.clone();
            let init_period = period.clone();
            tokio::task::spawn_blocking(move || {
                let mut parser = parser
                    .lock()
                    .map_err(|_| anyhow::anyhow!("caption parser lock poisoned"))?;
                parser
                    .parse_init(&init, &init_period)
                    .context("Failed to parse init segment")
            })
            .await??;
            current_period = Some(period.clone());
        }

        let data = match tokio::fs::read(&segment.path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Skipping segment {:?}: {}", segment.path, e);
                result.segments_skipped += 1;
                continue;
            }
        };

        let parser = parser.clone();
        let segment_id = idx as u64 + 1;
        let work = tokio::task::spawn_blocking(move || {
            let mut parser = parser
                .lock()
                .map_err(|_| anyhow::anyhow!("caption parser lock poisoned"))?;
            Ok::<_, anyhow::Error>(parser.parse_media(&data, segment_id, &period))
        });

        match tokio::time::timeout(timeout, work).await {
            Ok(Ok(Ok(cues))) => {
                result.segments_decoded += 1;
                for cue in cues {
                    result
                        .streams
                        .entry(cue.stream().to_string())
                        .or_default()
                        .push(cue);
                }
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!("Segment {:?} failed: {:#}", segment.path, e);
                result.segments_skipped += 1;
            }
            Ok(Err(e)) => {
                tracing::warn!("Segment {:?} task failed: {}", segment.path, e);
                result.segments_skipped += 1;
            }
            Err(_) => {
                tracing::warn!(
                    "Segment {:?} timed out after {:?}, dropping its captions",
                    segment.path,
                    timeout
                );
                result.segments_skipped += 1;
            }
        }
    }

    Ok(result)
}

/// Stream label to language, gathered from every representation's
/// accessibility value.
pub fn caption_languages(config: &Config) -> HashMap<String, String> {
    let mut languages = HashMap::new();
    for rep in &config.representations {
        let (Some(scheme), Some(value)) = (rep.captions.as_deref(), rep.caption_languages.as_deref())
        else {
            continue;
        };
        let Ok(scheme) = scheme.parse::<CeaScheme>() else {
            continue;
        };
        languages.extend(stream_languages(scheme, value));
    }
    languages
}

/// Write one pretty-printed JSON array of cues per stream under
/// `{out_dir}/captions/`.
pub async fn write_captions(
    captions: &Captions,
    languages: &HashMap<String, String>,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join("captions");
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {:?}", dir))?;

    let mut written = Vec::with_capacity(captions.len());
    for (key, stream) in captions {
        let filename = match languages.get(&stream.stream) {
            Some(lang) => format!("captions-{}-{}.json", lang, key),
            None => format!("captions-{}.json", key),
        };
        let path = dir.join(filename);
        let json = serde_json::to_vec_pretty(&stream.cues)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        written.push(path);
    }
    Ok(written)
}

/// Report every cue id present in one representation of a stream and absent
/// from another representation of the same stream.
pub fn validate_captions(captions: &Captions) -> Vec<MissingCue> {
    let mut by_stream: BTreeMap<&str, Vec<(&str, BTreeSet<&str>)>> = BTreeMap::new();
    for (key, stream) in captions {
        let ids = stream.cues.iter().map(|c| c.id.as_str()).collect();
        by_stream
            .entry(stream.stream.as_str())
            .or_default()
            .push((key.as_str(), ids));
    }

    let mut missing = Vec::new();
    for (stream, members) in &by_stream {
        for (target_key, target_ids) in members {
            for (candidate_key, candidate_ids) in members {
                if target_key == candidate_key {
                    continue;
                }
                for id in target_ids.difference(candidate_ids) {
                    tracing::debug!(
                        "Cue {} in {} not found in {}",
                        id,
                        target_key,
                        candidate_key
                    );
                    missing.push(MissingCue {
                        stream: stream.to_string(),
                        cue_id: id.to_string(),
                        present_in: target_key.to_string(),
                        missing_from: candidate_key.to_string(),
                    });
                }
            }
        }
    }
    missing
}

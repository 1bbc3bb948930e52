//! Orchestrator: sequences the pure/async pipeline stages in strict
//! dependency order over one job, owning the per-job context (config, OCR
//! port, storage port, validator port, progress reporter) — no stage
//! reaches past its arguments into ambient global state.

use crate::aggregator::{self, Contribution};
use crate::classifier;
use crate::config::PipelineConfig;
use crate::domain::{
    Classification, Hand, Job, JobStage, MatchRecord, RewrittenFile, RewrittenHand, Screenshot,
};
use crate::error::PipelineError;
use crate::mapping;
use crate::matcher;
use crate::ocr;
use crate::parser;
use crate::ports::{OcrPort, StoragePort, ValidatorPort};
use crate::progress::{ProgressReporter, StageCounts};
use crate::rewriter;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One hand-history file as handed to the pipeline: a name (for warning
/// attribution) and its raw UTF-8 contents.
pub struct InputFile {
    pub name: String,
    pub content: String,
}

pub struct Pipeline {
    config: PipelineConfig,
    ocr: Arc<dyn OcrPort>,
    storage: Arc<dyn StoragePort>,
    validator: Arc<dyn ValidatorPort>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        ocr: Arc<dyn OcrPort>,
        storage: Arc<dyn StoragePort>,
        validator: Arc<dyn ValidatorPort>,
    ) -> Self {
        Self { config, ocr, storage, validator }
    }

    /// Runs one job to completion (or to `Failed`/`Cancelled`). Persists the
    /// job record and derived outputs at every stage boundary, and emits a
    /// progress event at each boundary.
    pub async fn run(
        &self,
        job_id: impl Into<String>,
        files: Vec<InputFile>,
        screenshots: Vec<Screenshot>,
        progress: ProgressReporter,
        cancel: CancellationToken,
    ) -> Job {
        let mut job = Job::new(job_id, self.config.clone());
        job.screenshots = screenshots;

        if let Err(err) = self.run_stages(&mut job, files, &progress, &cancel).await {
            job.record_error(err.clone());
            job.stage = if matches!(err, PipelineError::Cancelled) {
                JobStage::Cancelled
            } else {
                JobStage::Failed
            };
        } else if !job.is_terminal() {
            job.stage = JobStage::Completed;
        }

        if let Err(err) = self.persist(&job).await {
            job.record_error(err);
            job.stage = JobStage::Failed;
        }
        progress.emit(job.stage, self.job_counts(&job));
        job
    }

    async fn run_stages(
        &self,
        job: &mut Job,
        files: Vec<InputFile>,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        self.stage_parse(job, files, progress).await?;
        self.checkpoint(job, progress, cancel).await?;

        self.stage_ocr_a(job, progress, cancel).await?;
        self.checkpoint(job, progress, cancel).await?;

        // First pass runs off OCR-A alone; its bindings are superseded by
        // the second pass below once OCR-B has populated every screenshot's
        // payload.
        self.stage_match(job, progress);

        self.stage_ocr_b(job, progress, cancel).await?;
        self.checkpoint(job, progress, cancel).await?;

        let bindings = self.stage_match(job, progress);
        self.stage_mapping(job, &bindings, progress);
        self.stage_aggregate(job, progress);
        self.stage_rewrite(job, progress);
        self.stage_classify(job, progress).await;
        Ok(())
    }

    async fn checkpoint(
        &self,
        job: &mut Job,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            let _ = self.persist(job).await;
            progress.emit(JobStage::Cancelled, self.job_counts(job));
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    async fn with_timeout<T>(
        &self,
        stage: JobStage,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, PipelineError> {
        let budget = Duration::from_secs(self.config.stage_timeout_seconds);
        tokio::time::timeout(budget, fut)
            .await
            .map_err(|_| PipelineError::StageTimeout { stage: format!("{stage:?}") })
    }


    async fn stage_parse(
        &self,
        job: &mut Job,
        files: Vec<InputFile>,
        progress: &ProgressReporter,
    ) -> Result<(), PipelineError> {
        job.stage = JobStage::Parsing;
        for (file_key, file) in files.iter().enumerate() {
            let outcome = parser::parse_file(&file.name, &file.content, file_key as u64);
            for warning in outcome.warnings {
                job.record_error(warning);
            }
            job.hands.extend(outcome.hands);
        }
        self.persist(job).await?;
        progress.emit(job.stage, self.job_counts(job));
        Ok(())
    }


    async fn stage_ocr_a(
        &self,
        job: &mut Job,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        job.stage = JobStage::OcrA;
        let outcomes = self
            .with_timeout(
                job.stage,
                ocr::run_ocr_a(&job.screenshots, self.ocr.as_ref(), &self.config, cancel),
            )
            .await?;
        for (shot, outcome) in job.screenshots.iter_mut().zip(outcomes) {
            shot.ocr_a = Some(outcome);
        }
        self.persist(job).await?;
        progress.emit(job.stage, self.job_counts(job));
        Ok(())
    }


    async fn stage_ocr_b(
        &self,
        job: &mut Job,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        job.stage = JobStage::OcrB;
        let bound_hand_ids: HashSet<&str> = job
            .screenshots
            .iter()
            .filter_map(|s| s.matched_hand_id.as_deref())
            .collect();
        let unclaimed_hands: Vec<&Hand> = job
            .hands
            .iter()
            .filter(|h| !bound_hand_ids.contains(h.hand_id.as_str()))
            .collect();
        let window = self.config.match_time_window_seconds;
        let indexed: Vec<(usize, &Screenshot)> = job
            .screenshots
            .iter()
            .enumerate()
            .filter(|(_, shot)| {
                shot.matched_hand_id.is_some()
                    || unclaimed_hands.iter().any(|h| matcher::within_window(h, shot, window))
            })
            .collect();
        let mut outcomes = self
            .with_timeout(
                job.stage,
                ocr::run_ocr_b(&indexed, self.ocr.as_ref(), &self.config, cancel),
            )
            .await?;
        outcomes.sort_by_key(|(index, _)| *index);
        for (index, outcome) in outcomes {
            job.screenshots[index].ocr_b = Some(outcome);
        }
        self.persist(job).await?;
        progress.emit(job.stage, self.job_counts(job));
        Ok(())
    }


    /// Pure and idempotent: safe to call again once OCR-B has populated
    /// more screenshots. Records bindings/unmatched on `job`.
    fn stage_match(&self, job: &mut Job, progress: &ProgressReporter) -> matcher::MatchOutcome {
        job.stage = JobStage::Matching;
        let outcome = matcher::match_screenshots(&job.hands, &job.screenshots, &self.config);
        for shot in &mut job.screenshots {
            shot.matched_hand_id = None;
            shot.match_confidence = None;
        }
        for binding in &outcome.bindings {
            if let Some(shot) = job
                .screenshots
                .iter_mut()
                .find(|s| s.filename == binding.screenshot_filename)
            {
                shot.matched_hand_id = Some(binding.hand_id.clone());
                shot.match_confidence = Some(binding.confidence);
            }
        }
        job.unmatched = outcome.unmatched.clone();
        progress.emit(job.stage, self.job_counts(job));
        outcome
    }


    fn stage_mapping(&self, job: &mut Job, bindings: &matcher::MatchOutcome, progress: &ProgressReporter) {
        job.stage = JobStage::Mapping;
        let shot_by_filename: HashMap<&str, &Screenshot> =
            job.screenshots.iter().map(|s| (s.filename.as_str(), s)).collect();
        let binding_by_hand: HashMap<&str, &str> = bindings
            .bindings
            .iter()
            .map(|b| (b.hand_id.as_str(), b.screenshot_filename.as_str()))
            .collect();

        let mut matches: Vec<MatchRecord> = Vec::new();
        for group in group_hands_by_table(&job.hands) {
            let mut ordered = group;
            ordered.sort_by_key(|h| h.timestamp);
            let mut known_names: HashSet<String> = HashSet::new();
            for hand in ordered {
                let Some(&filename) = binding_by_hand.get(hand.hand_id.as_str()) else { continue };
                let Some(&shot) = shot_by_filename.get(filename) else { continue };
                let Some(payload) = shot.ocr_b_payload() else {
                    let err = PipelineError::OcrSchema { screenshot: filename.to_string() };
                    log::warn!("job {}: {}", job.id, err);
                    job.errors.push(err);
                    continue;
                };
                let outcome = mapping::derive_mapping(hand, payload, &known_names, &self.config);
                if outcome.conflict {
                    let err = PipelineError::MappingConflict {
                        hand_id: hand.hand_id.clone(),
                        name: "<duplicate>".to_string(),
                    };
                    log::warn!("job {}: {}", job.id, err);
                    job.errors.push(err);
                    continue;
                }
                known_names.extend(outcome.mapping.values().cloned());
                matches.push(MatchRecord {
                    hand_id: hand.hand_id.clone(),
                    screenshot_filename: filename.to_string(),
                    confidence: shot.match_confidence.unwrap_or(0),
                    mapping: outcome.mapping,
                });
            }
        }
        job.matches = matches;
        progress.emit(job.stage, self.job_counts(job));
    }


    fn stage_aggregate(&self, job: &mut Job, progress: &ProgressReporter) {
        job.stage = JobStage::Aggregating;
        let hand_by_id: HashMap<&str, &Hand> =
            job.hands.iter().map(|h| (h.hand_id.as_str(), h)).collect();
        let contributions: Vec<Contribution> = job
            .matches
            .iter()
            .filter_map(|m| {
                let hand = *hand_by_id.get(m.hand_id.as_str())?;
                Some(Contribution { hand, mapping: m.mapping.clone() })
            })
            .collect();
        job.table_mappings = aggregator::aggregate(&contributions);
        for table in job.table_mappings.values() {
            for identifier in table.conflicts.keys() {
                job.errors.push(PipelineError::TableConflict {
                    table_id: table.table_id.clone(),
                    identifier: identifier.clone(),
                });
            }
        }
        progress.emit(job.stage, self.job_counts(job));
    }


    fn stage_rewrite(&self, job: &mut Job, progress: &ProgressReporter) {
        job.stage = JobStage::Rewriting;
        let mut outputs = Vec::with_capacity(job.hands.len());
        for hand in &job.hands {
            let empty = HashMap::new();
            let table = job
                .table_mappings
                .values()
                .find(|t| aggregator::same_table(&t.table_id, &hand.table_id));
            let accepted = table.map(|t| &t.accepted).unwrap_or(&empty);
            let text = rewriter::rewrite(&hand.raw_text, accepted);
            outputs.push(RewrittenHand {
                hand_id: hand.hand_id.clone(),
                source_file: hand.source_file.clone(),
                text,
                classification: Classification::Clean,
            });
        }
        job.hand_outputs = outputs;
        progress.emit(job.stage, self.job_counts(job));
    }


    async fn stage_classify(&self, job: &mut Job, progress: &ProgressReporter) {
        job.stage = JobStage::Classifying;
        for hand in &mut job.hand_outputs {
            hand.classification = classifier::classify(&hand.text, self.validator.as_ref()).await;
        }
        job.rewritten = group_by_file(&job.hand_outputs);
        progress.emit(job.stage, self.job_counts(job));
    }

    /// Storage failures are retried at the port boundary; a failure that
    /// survives every retry is fatal and ends the job.
    async fn persist(&self, job: &Job) -> Result<(), PipelineError> {
        let record = job.to_record();
        self.retry_write(|| self.storage.save_job(&record)).await?;

        let outcomes = job.screenshot_outcomes();
        self.retry_write(|| self.storage.save_screenshot_outcomes(&job.id, &outcomes)).await?;
        self.retry_write(|| self.storage.save_rewritten_files(&job.id, &job.rewritten)).await?;
        Ok(())
    }

    async fn retry_write<F, Fut>(&self, call: F) -> Result<(), PipelineError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<(), PipelineError>>,
    {
        let cancel = CancellationToken::new();
        let backoff_base = Duration::from_secs(self.config.retry_backoff_base_seconds);
        let backoff_cap = Duration::from_secs(self.config.retry_backoff_cap_seconds);
        ocr::call_with_retry(
            self.config.retry_max,
            backoff_base,
            backoff_cap,
            &cancel,
            |r: &Result<(), PipelineError>| r.is_err(),
            call,
        )
        .await
    }

    fn job_counts(&self, job: &Job) -> StageCounts {
        let total = job.screenshots.len();
        let failed = job.unmatched.len();
        StageCounts {
            total,
            succeeded: total.saturating_sub(failed),
            failed,
            in_flight: 0,
        }
    }
}

/// Clusters hands into per-table groups using the same identity-normalized
/// equality the aggregator itself uses, so the mapping stage's
/// `known_names` accumulation and the aggregator's own grouping never
/// disagree about which hands share a table.
fn group_hands_by_table(hands: &[Hand]) -> Vec<Vec<&Hand>> {
    let mut groups: Vec<Vec<&Hand>> = Vec::new();
    for hand in hands {
        match groups.iter_mut().find(|g| aggregator::same_table(&g[0].table_id, &hand.table_id)) {
            Some(group) => group.push(hand),
            None => groups.push(vec![hand]),
        }
    }
    groups
}

/// Whole files are classified by the worst hand they contain. Folds each
/// file's hands (in parse order) into one concatenated text and rolls the
/// classification up via [`classifier::classify_file`].
fn group_by_file(hand_outputs: &[RewrittenHand]) -> Vec<RewrittenFile> {
    let mut files: Vec<RewrittenFile> = Vec::new();
    for hand in hand_outputs {
        match files.iter_mut().find(|f| f.name == hand.source_file) {
            Some(file) => {
                file.hand_ids.push(hand.hand_id.clone());
                file.text.push('\n');
                file.text.push_str(&hand.text);
            }
            None => files.push(RewrittenFile {
                name: hand.source_file.clone(),
                hand_ids: vec![hand.hand_id.clone()],
                text: hand.text.clone(),
                classification: Classification::Clean,
            }),
        }
    }
    for file in &mut files {
        let worst = hand_outputs
            .iter()
            .filter(|h| h.source_file == file.name)
            .map(|h| &h.classification);
        file.classification = classifier::classify_file(worst);
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobRecord, OcrAOutcome, OcrBOutcome, OcrBPayload, PlayerRecord, Role, RewrittenFile as DomainRewrittenFile, ScreenshotOutcome, ScreenshotSource};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct ScenarioOneOcr;

    #[async_trait]
    impl OcrPort for ScenarioOneOcr {
        async fn extract_hand_id(&self, _shot: &Screenshot) -> OcrAOutcome {
            OcrAOutcome::Found("100".to_string())
        }
        async fn extract_players(&self, _shot: &Screenshot) -> OcrBOutcome {
            OcrBOutcome::Payload(OcrBPayload {
                players: vec![
                    PlayerRecord { name: "Alice".into(), stack: 200, role: Some(Role::Button), hole_cards: vec![] },
                    PlayerRecord { name: "Bob".into(), stack: 200, role: Some(Role::SmallBlind), hole_cards: vec![] },
                    PlayerRecord { name: "Carol".into(), stack: 200, role: Some(Role::BigBlind), hole_cards: vec![] },
                ],
                hero: PlayerRecord { name: "Carol".into(), stack: 200, role: Some(Role::BigBlind), hole_cards: vec![] },
                board: vec![],
            })
        }
    }

    struct NullStorage;

    #[async_trait]
    impl StoragePort for NullStorage {
        async fn save_job(&self, _record: &JobRecord) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn save_screenshot_outcomes(
            &self,
            _job_id: &str,
            _outcomes: &[ScreenshotOutcome],
        ) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn save_rewritten_files(
            &self,
            _job_id: &str,
            _files: &[DomainRewrittenFile],
        ) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn load_job(&self, _job_id: &str) -> Result<Option<JobRecord>, PipelineError> {
            Ok(None)
        }
    }

    const HAND_TEXT: &str = "Hand #100: Hold'em No Limit ($1/$2) - 2024/01/15 21:03:45 UTC\n\
Table 'T1' 6-max Seat #3 is the button\n\
Seat 1: a11111 ($200 in chips)\n\
Seat 2: b22222 ($200 in chips)\n\
Seat 3: hero ($200 in chips)\n\
a11111: posts small blind $1\n\
b22222: posts big blind $2\n\
a11111: folds\n\
b22222: folds\n\
Uncalled bet ($2) returned to hero\n\
hero collected $3 from pot\n\
*** SUMMARY ***\n\
Seat 1: a11111 folded before Flop\n\
Seat 2: b22222 folded before Flop\n\
Seat 3: hero collected ($3)\n";

    #[tokio::test]
    async fn end_to_end_scenario_one_produces_a_clean_rewritten_hand() {
        let pipeline = Pipeline::new(
            PipelineConfig::default(),
            Arc::new(ScenarioOneOcr),
            Arc::new(NullStorage),
            Arc::new(crate::ports::NullValidator),
        );
        let files = vec![InputFile { name: "file.txt".into(), content: HAND_TEXT.into() }];
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 21, 3, 45).unwrap();
        let screenshot = Screenshot::new("a.png", ScreenshotSource::InMemory(Arc::new(vec![])), "image/png", ts);
        let (tx, _rx) = crate::progress::channel();
        let progress = ProgressReporter::new("job-1", Some(tx));
        let cancel = CancellationToken::new();

        let job = pipeline.run("job-1", files, vec![screenshot], progress, cancel).await;

        assert_eq!(job.stage, JobStage::Completed);
        assert_eq!(job.rewritten.len(), 1);
        let rewritten = &job.rewritten[0];
        assert_eq!(rewritten.classification, Classification::Clean);
        assert!(rewritten.text.contains("Seat 1: Bob"));
        assert!(rewritten.text.contains("Seat 2: Carol"));
        assert!(rewritten.text.contains("Seat 3: Alice"));
        assert_eq!(rewritten.name, "file.txt");
        assert_eq!(rewritten.hand_ids, vec!["100".to_string()]);
    }

    #[test]
    fn a_residual_hand_downgrades_the_whole_file() {
        let outputs = vec![
            RewrittenHand {
                hand_id: "1".into(),
                source_file: "a.txt".into(),
                text: "clean hand".into(),
                classification: Classification::Clean,
            },
            RewrittenHand {
                hand_id: "2".into(),
                source_file: "a.txt".into(),
                text: "hero still here".into(),
                classification: Classification::Residual,
            },
            RewrittenHand {
                hand_id: "3".into(),
                source_file: "b.txt".into(),
                text: "another clean hand".into(),
                classification: Classification::Clean,
            },
        ];
        let files = group_by_file(&outputs);
        assert_eq!(files.len(), 2);
        let a = files.iter().find(|f| f.name == "a.txt").unwrap();
        assert_eq!(a.classification, Classification::Residual);
        assert_eq!(a.hand_ids, vec!["1".to_string(), "2".to_string()]);
        assert!(a.text.contains("clean hand") && a.text.contains("hero still here"));
        let b = files.iter().find(|f| f.name == "b.txt").unwrap();
        assert_eq!(b.classification, Classification::Clean);
    }
}

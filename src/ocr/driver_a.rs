//! OCR-A fan-out: hand-identifier extraction over every screenshot.

use super::concurrency::Limiter;
use super::retry::call_with_retry;
use crate::config::PipelineConfig;
use crate::domain::{OcrAOutcome, Screenshot};
use crate::ports::OcrPort;
use futures::future::join_all;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs OCR-A over every screenshot, bounded by the job's tier. Returns
/// outcomes re-sorted into the input's stable order.
pub async fn run_ocr_a<P: OcrPort + ?Sized>(
    screenshots: &[Screenshot],
    port: &P,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Vec<OcrAOutcome> {
    let limiter = Limiter::new(config);
    let timeout = Duration::from_secs(config.ocr_timeout_seconds);
    let backoff_base = Duration::from_secs(config.retry_backoff_base_seconds);
    let backoff_cap = Duration::from_secs(config.retry_backoff_cap_seconds);

    let calls = screenshots.iter().enumerate().map(|(index, shot)| {
        let limiter = &limiter;
        async move {
            if cancel.is_cancelled() {
                return (index, OcrAOutcome::TransientError("cancelled".into()));
            }
            let permit = match limiter.acquire(cancel).await {
                Ok(permit) => permit,
                Err(_) => return (index, OcrAOutcome::TransientError("cancelled".into())),
            };
            let outcome = call_with_retry(
                config.retry_max,
                backoff_base,
                backoff_cap,
                cancel,
                |o: &OcrAOutcome| matches!(o, OcrAOutcome::TransientError(_)),
                || async {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => OcrAOutcome::TransientError("cancelled".into()),
                        res = tokio::time::timeout(timeout, port.extract_hand_id(shot)) => {
                            res.unwrap_or_else(|_| OcrAOutcome::TransientError("timeout".into()))
                        }
                    }
                },
            )
            .await;
            drop(permit);
            if !matches!(outcome, OcrAOutcome::TransientError(_)) {
                limiter.record_completion();
            }
            (index, outcome)
        }
    });

    let mut results = join_all(calls).await;
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, outcome)| outcome).collect()
}

//! OCR-B fan-out: players + role extraction, restricted to the
//! screenshots the matcher already bound to a hand (cost-saving gate).

use super::concurrency::Limiter;
use super::retry::call_with_retry;
use crate::config::PipelineConfig;
use crate::domain::{OcrBOutcome, Screenshot};
use crate::ports::OcrPort;
use futures::future::join_all;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `matched` pairs each screenshot's original index with a reference to it.
/// Unmatched screenshots must never be passed in here. Returns outcomes
/// keyed by that original index, order-independent (callers index back in).
pub async fn run_ocr_b<P: OcrPort + ?Sized>(
    matched: &[(usize, &Screenshot)],
    port: &P,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Vec<(usize, OcrBOutcome)> {
    let limiter = Limiter::new(config);
    let timeout = Duration::from_secs(config.ocr_timeout_seconds);
    let backoff_base = Duration::from_secs(config.retry_backoff_base_seconds);
    let backoff_cap = Duration::from_secs(config.retry_backoff_cap_seconds);

    let calls = matched.iter().map(|&(index, shot)| {
        let limiter = &limiter;
        async move {
            if cancel.is_cancelled() {
                return (index, OcrBOutcome::TransientError("cancelled".into()));
            }
            let permit = match limiter.acquire(cancel).await {
                Ok(permit) => permit,
                Err(_) => return (index, OcrBOutcome::TransientError("cancelled".into())),
            };
            let outcome = call_with_retry(
                config.retry_max,
                backoff_base,
                backoff_cap,
                cancel,
                |o: &OcrBOutcome| matches!(o, OcrBOutcome::TransientError(_)),
                || async {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => OcrBOutcome::TransientError("cancelled".into()),
                        res = tokio::time::timeout(timeout, port.extract_players(shot)) => {
                            res.unwrap_or_else(|_| OcrBOutcome::TransientError("timeout".into()))
                        }
                    }
                },
            )
            .await;
            drop(permit);
            if !matches!(outcome, OcrBOutcome::TransientError(_)) {
                limiter.record_completion();
            }
            // A structurally-valid-but-empty payload is logged and demoted
            // to a failure so the hand falls back to the positional path.
            let outcome = match outcome {
                OcrBOutcome::Payload(payload) if !payload.is_schema_valid() => {
                    log::warn!("ocr-b payload for {} failed schema validation", shot.filename);
                    OcrBOutcome::Malformed
                }
                other => other,
            };
            (index, outcome)
        }
    });

    join_all(calls).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OcrAOutcome, OcrBPayload, PlayerRecord, Role, ScreenshotSource};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FakeOcr;

    #[async_trait]
    impl OcrPort for FakeOcr {
        async fn extract_hand_id(&self, _shot: &Screenshot) -> OcrAOutcome {
            OcrAOutcome::NotFound
        }
        async fn extract_players(&self, shot: &Screenshot) -> OcrBOutcome {
            if shot.filename == "empty.png" {
                OcrBOutcome::Payload(OcrBPayload {
                    players: vec![],
                    hero: PlayerRecord { name: "Hero".into(), stack: 200, role: None, hole_cards: vec![] },
                    board: vec![],
                })
            } else {
                OcrBOutcome::Payload(OcrBPayload {
                    players: vec![PlayerRecord {
                        name: "Alice".into(),
                        stack: 200,
                        role: Some(Role::Button),
                        hole_cards: vec![],
                    }],
                    hero: PlayerRecord { name: "Hero".into(), stack: 200, role: None, hole_cards: vec![] },
                    board: vec![],
                })
            }
        }
    }

    fn shot(name: &str) -> Screenshot {
        Screenshot::new(name, ScreenshotSource::InMemory(Arc::new(vec![])), "image/png", chrono::Utc::now())
    }

    #[tokio::test]
    async fn demotes_an_empty_players_list_to_malformed() {
        let port = FakeOcr;
        let shots = vec![shot("empty.png"), shot("full.png")];
        let matched: Vec<(usize, &Screenshot)> = shots.iter().enumerate().collect();
        let mut config = PipelineConfig::default();
        config.tier = crate::config::Tier::Unrestricted;
        let cancel = CancellationToken::new();
        let mut outcomes = run_ocr_b(&matched, &port, &config, &cancel).await;
        outcomes.sort_by_key(|(i, _)| *i);
        assert!(matches!(outcomes[0].1, OcrBOutcome::Malformed));
        assert!(matches!(outcomes[1].1, OcrBOutcome::Payload(_)));
    }
}

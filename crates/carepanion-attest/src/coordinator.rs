//! The attestation state machine.
//!
//! `validating -> deduplicating -> hashing -> submitting -> persisting -> completed`
//!
//! Everything before `submitting` is side-effect free and may be abandoned at
//! any point. From `submitting` on, the attempt runs in its own task: a
//! broadcast transaction cannot be recalled, so a caller that goes away does
//! not stop the attempt from finishing and persisting.
//!
//! The dedupe check and the final insert are not isolated from each other.
//! Two concurrent submissions for the same pair can both reach the ledger; the
//! store's uniqueness constraint turns the second persist into a
//! `PersistFailure`.

use std::sync::Arc;

use carepanion_core::hashing::{content_hash, ContentHash};
use carepanion_core::model::{Attestation, AudioFile, NewLabel, ParticipantId, Rating, RatingRequest};
use carepanion_core::pipeline::Phase;
use carepanion_core::{AttestError, AttestResult};
use carepanion_solana_client::{
    build_record_label, derive_user_stats, AttestationInstruction, LedgerRpc, Prepared, BLOCKHASH_VALIDITY,
};
use carepanion_store::{LabelStore, StoreError};
use solana_sdk::signature::Signer;
use solana_sdk::transaction::Transaction;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::Instrument;

use crate::context::AttestationContext;

/// Log target for ledger writes that have no matching label row.
pub const RECONCILE_TARGET: &str = "carepanion::reconcile";

pub struct AttestationCoordinator<R, S> {
    ctx: Arc<AttestationContext<R, S>>,
}

impl<R, S> Clone for AttestationCoordinator<R, S> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

fn store_unavailable(e: StoreError) -> AttestError {
    AttestError::store_unavailable(e.to_string())
}

impl<R, S> AttestationCoordinator<R, S>
where
    R: LedgerRpc + 'static,
    S: LabelStore + 'static,
{
    pub fn new(ctx: Arc<AttestationContext<R, S>>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AttestationContext<R, S> {
        &self.ctx
    }

    /// Validate, attest and persist one rating for `participant` (base58 key).
    #[tracing::instrument(
        name = "attest",
        skip_all,
        fields(participant = %participant, audio_id = request.audio_id)
    )]
    pub async fn submit(&self, participant: &str, request: RatingRequest) -> AttestResult<Attestation> {
        tracing::debug!(phase = %Phase::Validating);
        let participant = ParticipantId::parse(participant)?;
        let rating = Rating::try_from(request)?;
        let audio_id = rating.audio_id();
        if !self.ctx.store.audio_exists(audio_id).await.map_err(store_unavailable)? {
            return Err(AttestError::not_found(format!(
                "audio file with id {audio_id} not found"
            )));
        }

        tracing::debug!(phase = %Phase::Deduplicating);
        let existing = self
            .ctx
            .store
            .find_label(&participant, audio_id)
            .await
            .map_err(store_unavailable)?;
        if existing.is_some() {
            return Err(AttestError::Conflict {
                participant: participant.to_string(),
                audio_id,
            });
        }

        tracing::debug!(phase = %Phase::Hashing);
        let digest = content_hash(&rating);

        let ctx = Arc::clone(&self.ctx);
        let attempt = tokio::spawn(
            submit_and_persist(ctx, participant, rating, digest).instrument(tracing::Span::current()),
        );
        settle(attempt.await, &participant, audio_id, &digest)
    }

    /// Lowest-id audio clip the participant has not labeled yet.
    pub async fn next_audio(&self, participant: &str) -> AttestResult<AudioFile> {
        let participant = ParticipantId::parse(participant)?;
        self.ctx
            .store
            .next_unlabeled_audio(&participant)
            .await
            .map_err(store_unavailable)?
            .ok_or_else(|| AttestError::not_found("no more audio files available to label"))
    }
}

/// Outcome of the detached Submitting/Persisting task as seen by the caller.
fn settle(
    joined: Result<AttestResult<Attestation>, JoinError>,
    participant: &ParticipantId,
    audio_id: u64,
    digest: &ContentHash,
) -> AttestResult<Attestation> {
    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            // The broadcast may already have landed.
            tracing::error!(
                target: RECONCILE_TARGET,
                participant = %participant,
                audio_id,
                content_hash = %hex::encode(digest),
                reason = %e,
                "attestation task stopped after submission began"
            );
            Err(AttestError::Interrupted(e.to_string()))
        }
    }
}

async fn submit_and_persist<R: LedgerRpc, S: LabelStore>(
    ctx: Arc<AttestationContext<R, S>>,
    participant: ParticipantId,
    rating: Rating,
    digest: ContentHash,
) -> AttestResult<Attestation> {
    let audio_id = rating.audio_id();
    let hash_hex = hex::encode(digest);

    tracing::debug!(phase = %Phase::Submitting, content_hash = %hash_hex);
    let signature = match submit_to_ledger(&ctx, &participant, audio_id, digest).await {
        Ok(sig) => sig,
        Err(err) => {
            tracing::warn!(
                participant = %participant,
                audio_id,
                content_hash = %hash_hex,
                code = err.code(),
                error = %err,
                "ledger attestation failed; nothing persisted"
            );
            return Err(err);
        }
    };

    tracing::debug!(phase = %Phase::Persisting, signature = %signature);
    let label = NewLabel {
        participant,
        rating,
        transaction_hash: signature.clone(),
    };
    match ctx.store.insert_label(label).await {
        Ok(record) => {
            tracing::info!(
                phase = %Phase::Completed,
                label_id = record.id,
                signature = %signature,
                "rating attested"
            );
            Ok(Attestation::success(record.id, signature))
        }
        Err(e) => {
            tracing::error!(
                target: RECONCILE_TARGET,
                participant = %participant,
                audio_id,
                content_hash = %hash_hex,
                signature = %signature,
                reason = %e,
                "ledger write succeeded but label was not persisted"
            );
            Err(AttestError::PersistFailure {
                signature,
                reason: e.to_string(),
            })
        }
    }
}

async fn submit_to_ledger<R: LedgerRpc, S: LabelStore>(
    ctx: &AttestationContext<R, S>,
    participant: &ParticipantId,
    audio_id: u64,
    digest: ContentHash,
) -> AttestResult<String> {
    let program_id = ctx
        .program_id
        .ok_or_else(|| AttestError::not_configured("not configured"))?;
    let payer = ctx
        .treasury
        .keypair()
        .map_err(|e| AttestError::signing(e.0))?
        .pubkey();

    let user_stats = derive_user_stats(&program_id, participant)?;
    let payload = AttestationInstruction::record_label(digest, audio_id);
    let instruction = build_record_label(program_id, payer, user_stats.address, &payload);

    let submitter = &ctx.submitter;
    // Once signed, the same transaction is rebroadcast; a fresh one could land twice.
    let mut signed: Option<(Transaction, Instant)> = None;
    let mut attempt = 1;
    loop {
        let outcome = match signed.as_ref() {
            Some((tx, _)) => submitter.broadcast(tx).await.into_signature(),
            None => match submitter.prepare(&instruction, &ctx.treasury).await {
                Err(e) => Err(AttestError::signing(e.0)),
                Ok(Prepared::Unavailable(reason)) => Err(AttestError::ChainUnavailable(reason)),
                Ok(Prepared::Signed(tx)) => {
                    let result = submitter.broadcast(&tx).await.into_signature();
                    signed = Some((tx, Instant::now()));
                    result
                }
            },
        };
        match outcome {
            Ok(sig) => return Ok(sig),
            Err(err) if ctx.retry.should_retry(attempt, &err) => {
                let delay = ctx.retry.backoff(attempt);
                if let Some((_, signed_at)) = &signed {
                    if signed_at.elapsed() + delay >= BLOCKHASH_VALIDITY {
                        tracing::warn!(attempt, error = %err, "blockhash expiring; not rebroadcasting");
                        return Err(err);
                    }
                }
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    rebroadcast = signed.is_some(),
                    error = %err,
                    "ledger unavailable; retrying submission"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

//! Carepanion data models.
//!
//! `Rating` is the validated, immutable value the pipeline hashes and attests.
//! `RatingRequest` is its untyped transport shape; converting one into the other
//! is the Validating phase, so a `Rating` can never hold out-of-range values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{AttestError, AttestResult};

/// Lowest accepted value for the 1..=5 scales.
pub const LEVEL_MIN: u8 = 1;
/// Highest accepted value for the 1..=5 scales.
pub const LEVEL_MAX: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakingRate {
    Slow,
    Medium,
    Fast,
}

impl SpeakingRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Medium => "Medium",
            Self::Fast => "Fast",
        }
    }
}

impl FromStr for SpeakingRate {
    type Err = AttestError;

    fn from_str(s: &str) -> AttestResult<Self> {
        match s {
            "Slow" => Ok(Self::Slow),
            "Medium" => Ok(Self::Medium),
            "Fast" => Ok(Self::Fast),
            _ => Err(AttestError::validation(format!("unknown speaking_rate: {s}"))),
        }
    }
}

impl fmt::Display for SpeakingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerceivedEmpathy {
    Low,
    Medium,
    High,
}

impl PerceivedEmpathy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for PerceivedEmpathy {
    type Err = AttestError;

    fn from_str(s: &str) -> AttestResult<Self> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            _ => Err(AttestError::validation(format!("unknown perceived_empathy: {s}"))),
        }
    }
}

impl fmt::Display for PerceivedEmpathy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant's 32-byte public key, written as base58 on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId([u8; 32]);

impl ParticipantId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn parse(s: &str) -> AttestResult<Self> {
        let raw = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| AttestError::validation(format!("participant is not base58: {e}")))?;
        let bytes: [u8; 32] = raw.try_into().map_err(|v: Vec<u8>| {
            AttestError::validation(format!("participant key must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for ParticipantId {
    type Err = AttestError;

    fn from_str(s: &str) -> AttestResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = AttestError;

    fn try_from(s: String) -> AttestResult<Self> {
        Self::parse(&s)
    }
}

impl From<ParticipantId> for String {
    fn from(p: ParticipantId) -> Self {
        p.to_string()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({self})")
    }
}

/// Untyped rating as received from a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub audio_id: u64,
    pub comfort_level: i64,
    pub clarity: i64,
    pub speaking_rate: String,
    pub perceived_empathy: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated rating of one audio clip.
///
/// Fields are private; the only way in is `Rating::new` or a `RatingRequest`
/// conversion, both of which enforce the level ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RatingRequest", into = "RatingRequest")]
pub struct Rating {
    audio_id: u64,
    comfort_level: u8,
    clarity: u8,
    speaking_rate: SpeakingRate,
    perceived_empathy: PerceivedEmpathy,
    notes: Option<String>,
}

impl Rating {
    pub fn new(
        audio_id: u64,
        comfort_level: u8,
        clarity: u8,
        speaking_rate: SpeakingRate,
        perceived_empathy: PerceivedEmpathy,
        notes: Option<String>,
    ) -> AttestResult<Self> {
        check_level("comfort_level", comfort_level as i64)?;
        check_level("clarity", clarity as i64)?;
        Ok(Self {
            audio_id,
            comfort_level,
            clarity,
            speaking_rate,
            perceived_empathy,
            notes,
        })
    }

    pub fn audio_id(&self) -> u64 {
        self.audio_id
    }

    pub fn comfort_level(&self) -> u8 {
        self.comfort_level
    }

    pub fn clarity(&self) -> u8 {
        self.clarity
    }

    pub fn speaking_rate(&self) -> SpeakingRate {
        self.speaking_rate
    }

    pub fn perceived_empathy(&self) -> PerceivedEmpathy {
        self.perceived_empathy
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

fn check_level(field: &str, value: i64) -> AttestResult<u8> {
    if (LEVEL_MIN as i64..=LEVEL_MAX as i64).contains(&value) {
        Ok(value as u8)
    } else {
        Err(AttestError::validation(format!(
            "{field} must be between {LEVEL_MIN} and {LEVEL_MAX}, got {value}"
        )))
    }
}

impl TryFrom<RatingRequest> for Rating {
    type Error = AttestError;

    fn try_from(req: RatingRequest) -> AttestResult<Self> {
        Ok(Self {
            audio_id: req.audio_id,
            comfort_level: check_level("comfort_level", req.comfort_level)?,
            clarity: check_level("clarity", req.clarity)?,
            speaking_rate: req.speaking_rate.parse()?,
            perceived_empathy: req.perceived_empathy.parse()?,
            notes: req.notes,
        })
    }
}

impl From<Rating> for RatingRequest {
    fn from(r: Rating) -> Self {
        Self {
            audio_id: r.audio_id,
            comfort_level: r.comfort_level as i64,
            clarity: r.clarity as i64,
            speaking_rate: r.speaking_rate.as_str().to_string(),
            perceived_empathy: r.perceived_empathy.as_str().to_string(),
            notes: r.notes,
        }
    }
}

/// An entry in the audio catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFile {
    pub id: u64,
    pub file_url: String,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

/// A label row to be inserted once the ledger accepted the attestation.
#[derive(Debug, Clone)]
pub struct NewLabel {
    pub participant: ParticipantId,
    pub rating: Rating,
    pub transaction_hash: String,
}

/// A persisted label row.
///
/// `transaction_hash` is the ledger signature anchoring the row. It is optional
/// because the store is shared; rows written by this pipeline always carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub id: i64,
    pub participant: String,
    pub audio_id: u64,
    pub comfort_level: u8,
    pub clarity: u8,
    pub speaking_rate: SpeakingRate,
    pub perceived_empathy: PerceivedEmpathy,
    pub notes: Option<String>,
    pub transaction_hash: Option<String>,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// Outcome of one ledger submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SubmissionResult {
    /// Network-assigned transaction signature.
    Signature(String),
    /// The ledger actively refused the transaction.
    Rejected(String),
    /// No definitive answer was obtained.
    Unavailable(String),
}

impl SubmissionResult {
    /// Collapse into the signature or the matching chain error.
    pub fn into_signature(self) -> AttestResult<String> {
        match self {
            Self::Signature(sig) => Ok(sig),
            Self::Rejected(reason) => Err(AttestError::ChainRejected(reason)),
            Self::Unavailable(reason) => Err(AttestError::ChainUnavailable(reason)),
        }
    }
}

/// Coordinator success output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub status: String,
    pub label_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_signature: Option<String>,
}

impl Attestation {
    pub fn success(label_id: i64, signature: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            label_id,
            transaction_signature: Some(signature.into()),
        }
    }
}

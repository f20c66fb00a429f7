#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rampart_system_spawning::SchedulerSnapshot;

const SNAPSHOT_DOMAIN: &str = "rampart";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "rampart:v1";
/// Delimiter used to separate the prefix segments and the payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a mid-wave scheduler snapshot into a single-line token suitable
/// for clipboard transfer between sessions.
pub(crate) fn encode(snapshot: &SchedulerSnapshot) -> String {
    let json = serde_json::to_vec(snapshot).expect("scheduler snapshot serialization never fails");
    let encoded = STANDARD_NO_PAD.encode(json);
    format!("{SNAPSHOT_HEADER}:{encoded}")
}

/// Decodes a scheduler snapshot from its token representation.
pub(crate) fn decode(value: &str) -> Result<SchedulerSnapshot, SnapshotTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SnapshotTransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().ok_or(SnapshotTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(SnapshotTransferError::MissingVersion)?;
    let payload = parts.next().ok_or(SnapshotTransferError::MissingPayload)?;

    if domain != SNAPSHOT_DOMAIN {
        return Err(SnapshotTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotTransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SnapshotTransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(SnapshotTransferError::InvalidPayload)
}

/// Errors that can occur while decoding snapshot transfer tokens.
#[derive(Debug)]
pub(crate) enum SnapshotTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    MissingVersion,
    /// The encoded snapshot did not include the payload segment.
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for SnapshotTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "snapshot token was empty"),
            Self::MissingPrefix => write!(f, "snapshot token is missing the prefix"),
            Self::MissingVersion => write!(f, "snapshot token is missing the version"),
            Self::MissingPayload => write!(f, "snapshot token is missing the payload"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "snapshot prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "snapshot version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode snapshot payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse snapshot payload: {error}")
            }
        }
    }
}

impl Error for SnapshotTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::WaveNumber;
    use rampart_system_spawning::{Config, SpawnScheduler};
    use rampart_system_wave_generation::WaveGenerator;
    use std::time::Duration;

    fn mid_wave_snapshot() -> SchedulerSnapshot {
        let mut scheduler = SpawnScheduler::new(Config::new(17), WaveGenerator::new(99));
        scheduler.set_spawn_points(vec![glam::Vec2::new(8.0, 8.0)]);
        scheduler
            .start_wave(WaveNumber::FIRST)
            .expect("generated wave");
        let _ = scheduler.update(Duration::from_secs(3));
        scheduler.snapshot()
    }

    #[test]
    fn round_trip_mid_wave_snapshot() {
        let snapshot = mid_wave_snapshot();
        let token = encode(&snapshot);
        assert!(token.starts_with(&format!("{SNAPSHOT_HEADER}:")));

        let decoded = decode(&token).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn decode_rejects_foreign_tokens() {
        assert!(matches!(
            decode(""),
            Err(SnapshotTransferError::EmptyPayload)
        ));
        assert!(matches!(
            decode("bastion:v1:abc"),
            Err(SnapshotTransferError::InvalidPrefix(_))
        ));
        assert!(matches!(
            decode("rampart:v9:abc"),
            Err(SnapshotTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            decode("rampart:v1:!!!"),
            Err(SnapshotTransferError::InvalidEncoding(_))
        ));
    }
}

use std::fmt;

use crate::common::random::{EntropyError, random_hex};

use super::aspect::Orientation;

/// Random bytes behind every key; 32 bytes gives 64 hex characters.
pub const KEY_ENTROPY_BYTES: usize = 32;

pub const VIDEO_EXTENSION: &str = "mp4";

/// `<orientation>/<64 hex chars>.<ext>`, the object name a video is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn build(orientation: Orientation, extension: &str) -> Result<Self, EntropyError> {
        let id = random_hex(KEY_ENTROPY_BYTES)?;
        Ok(Self(format!("{}/{}.{}", orientation, id, extension)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
pub(crate) fn is_well_formed_video_key(key: &str) -> bool {
    let Some((prefix, file)) = key.split_once('/') else {
        return false;
    };
    let Some(hex) = file.strip_suffix(".mp4") else {
        return false;
    };

    matches!(prefix, "landscape" | "portrait" | "other")
        && hex.len() == 64
        && hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

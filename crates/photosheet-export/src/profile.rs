//! Export profiles and download naming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a finished image is encoded for download or print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportProfile {
    /// The single filtered photo at full resolution, lossless PNG.
    #[default]
    Normal,
    /// The 1200×1800 passport sheet, JPEG at quality 95.
    Passport,
}

impl ExportProfile {
    /// JPEG quality used for passport sheets.
    pub const PASSPORT_JPEG_QUALITY: u8 = 95;

    /// Profile matching the session's output mode.
    #[must_use]
    pub const fn for_passport_mode(passport: bool) -> Self {
        if passport { Self::Passport } else { Self::Normal }
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Normal => "image/png",
            Self::Passport => "image/jpeg",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Normal => "png",
            Self::Passport => "jpg",
        }
    }
}

impl fmt::Display for ExportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Passport => f.write_str("passport"),
        }
    }
}

/// Default download name prefix.
pub const DEFAULT_FILE_PREFIX: &str = "photosheet-edit";

/// Download file name: `<prefix>-<timestamp_ms>.<ext>`.
#[must_use]
pub fn export_file_name(prefix: &str, timestamp_ms: u64, profile: ExportProfile) -> String {
    format!("{prefix}-{timestamp_ms}.{}", profile.extension())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_profile_extension() {
        assert_eq!(
            export_file_name("edit", 1_700_000_000_123, ExportProfile::Passport),
            "edit-1700000000123.jpg"
        );
        assert_eq!(
            export_file_name(DEFAULT_FILE_PREFIX, 5, ExportProfile::Normal),
            "photosheet-edit-5.png"
        );
    }

    #[test]
    fn mime_types() {
        assert_eq!(ExportProfile::Normal.mime_type(), "image/png");
        assert_eq!(ExportProfile::Passport.mime_type(), "image/jpeg");
    }

    #[test]
    fn mode_selects_profile() {
        assert_eq!(ExportProfile::for_passport_mode(true), ExportProfile::Passport);
        assert_eq!(ExportProfile::for_passport_mode(false), ExportProfile::Normal);
    }

    #[test]
    fn serde_names() {
        assert_eq!(
            serde_json::to_string(&ExportProfile::Passport).unwrap(),
            "\"passport\""
        );
    }
}

//! Static protocol constants for the Google Translate web endpoint.
//! All strings are &'static str; these are reverse-engineered and may drift upstream.

use crate::utils::PathStep::{self, Index};

/// Upstream endpoint paths
pub mod endpoints {
    pub const DEFAULT_BASE_URL: &str = "https://translate.google.com";
    pub const BATCH_PATH: &str = "/_/TranslateWebserverUi/data/batchexecute";
}

/// Opaque tokens embedded in the translate page
pub mod tokens {
    pub const RPC_ID: &str = "MkEWBc";
    pub const SESSION_ID: &str = "FdrFJe";
    pub const BACKEND_LIST: &str = "cfb2h";
}

/// HTTP headers for stealth mode
pub mod headers {
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
}

/// Batch-execute envelope framing
pub mod framing {
    /// Anti-XSRF prefix (`)]}'` plus blank line) in front of every response
    pub const PREFIX_CHARS: usize = 6;
    pub const BOLD_OPEN: &str = "<b>";
    pub const BOLD_CLOSE: &str = "</b>";
}

/// Request id: 1000 + 9000 * k, k in 1..=100
pub mod reqid {
    pub const BASE: u32 = 1000;
    pub const STEP: u32 = 9000;
    pub const MAX_MULTIPLIER: u32 = 100;
}

/// Limits and thresholds
pub mod limits {
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;
    /// Payloads shorter than this carry no dictionary entry
    pub const MIN_PAYLOAD_LEN: usize = 4;
}

pub const SOURCE_LANG: &str = "en";
pub const DEFAULT_TARGET_LANG: &str = "ru";

// Positions inside the decoded translation payload
pub static TRANSLATIONS_PATH: &[PathStep<'static>] = &[Index(3), Index(5), Index(0)];
pub static DEFINITIONS_PATH: &[PathStep<'static>] = &[Index(3), Index(1), Index(0)];
pub static EXAMPLES_PATH: &[PathStep<'static>] = &[Index(3), Index(2)];

//! Content constraint validation
//!
//! Pure, deterministic character-limit checks against the per-platform limit
//! table. Length is a naive Unicode scalar count (`chars().count()`),
//! measured identically across all platforms; real platforms weight URLs and
//! some scripts differently, and that behavior is deliberately not imitated
//! here.

use crate::types::PlatformId;

/// Outcome of checking one text against one platform's limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitCheck {
    pub platform: PlatformId,
    /// Character count of the text as presented
    pub length: usize,
    /// The platform's limit
    pub limit: usize,
    pub within_limit: bool,
}

impl LimitCheck {
    /// Characters left before the limit (zero when over)
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.length)
    }

    /// Characters over the limit (zero when within)
    pub fn overage(&self) -> usize {
        self.length.saturating_sub(self.limit)
    }
}

/// Check text length against a platform's character limit
pub fn check(text: &str, platform: PlatformId) -> LimitCheck {
    let length = text.chars().count();
    let limit = platform.profile().character_limit;
    LimitCheck {
        platform,
        length,
        limit,
        within_limit: length <= limit,
    }
}

/// Check text length against every requested platform
pub fn check_all(text: &str, platforms: &[PlatformId]) -> Vec<LimitCheck> {
    platforms.iter().map(|p| check(text, *p)).collect()
}

/// The subset of checks that are over limit
pub fn violations(checks: &[LimitCheck]) -> Vec<LimitCheck> {
    checks.iter().filter(|c| !c.within_limit).copied().collect()
}

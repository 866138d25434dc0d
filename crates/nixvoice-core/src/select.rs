//! Voice selection — picks one voice from the platform's list.

use crate::types::VoiceOption;

/// Vendor voices known to sound better than the platform default.
const PREFERRED_VENDOR: &str = "Google";

/// Language preferred when no vendor voice is present.
const PREFERRED_LANG: &str = "en-US";

/// Choose a voice, first match wins:
///
/// 1. name contains `"Google"`
/// 2. language tag contains `"en-US"`
/// 3. the first option in enumeration order
///
/// Returns `None` only for an empty list.
pub fn select_voice(options: &[VoiceOption]) -> Option<&VoiceOption> {
    options
        .iter()
        .find(|v| v.name.contains(PREFERRED_VENDOR))
        .or_else(|| options.iter().find(|v| v.lang.contains(PREFERRED_LANG)))
        .or_else(|| options.first())
}

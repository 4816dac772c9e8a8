//! Manual control resolution.
//!
//! Operators can switch the action off (or back on) by writing a marker
//! string into a pull request comment or a commit message. Only presence of
//! each marker is tested, never its position inside a text.
//!
//! Resolution order:
//! 1. The most recent comment that carries any marker gives the comment verdict.
//! 2. A commit message that carries any marker overrides the comment verdict.
//! 3. With no marker anywhere the run is enabled.
//!
//! Within one text carrying both markers, enable wins.

use serde::{Deserialize, Serialize};

use crate::domain::ManualControlState;

pub const DEFAULT_ENABLE_MARKER: &str = "enable-svgo-action";
pub const DEFAULT_DISABLE_MARKER: &str = "disable-svgo-action";

/// The pair of marker strings searched for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub enable: String,
    pub disable: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            enable: DEFAULT_ENABLE_MARKER.to_string(),
            disable: DEFAULT_DISABLE_MARKER.to_string(),
        }
    }
}

impl Markers {
    /// Verdict carried by a single text, if any.
    ///
    /// Disable presence is checked first and enable presence overrides it.
    pub fn verdict(&self, text: &str) -> Option<ManualControlState> {
        let mut verdict = None;
        if text.contains(&self.disable) {
            verdict = Some(ManualControlState::Disabled);
        }
        if text.contains(&self.enable) {
            verdict = Some(ManualControlState::Enabled);
        }
        verdict
    }
}

/// Resolve the manual control state of a run.
///
/// `comments` must be ordered newest first.
pub fn resolve(
    comments: &[String],
    commit_message: Option<&str>,
    markers: &Markers,
) -> ManualControlState {
    let from_comments = comments.iter().find_map(|c| markers.verdict(c));
    let from_commit = commit_message.and_then(|m| markers.verdict(m));

    from_commit
        .or(from_comments)
        .unwrap_or(ManualControlState::Enabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ManualControlState::{Disabled, Enabled};

    fn comments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn markers() -> Markers {
        Markers::default()
    }

    #[test]
    fn test_no_markers_anywhere_is_enabled() {
        let c = comments(&["But why is the rum gone", "Praise the sun"]);
        assert_eq!(resolve(&c, Some("Add icons"), &markers()), Enabled);
        assert_eq!(resolve(&[], None, &markers()), Enabled);
    }

    #[test]
    fn test_disable_comment_disables() {
        let c = comments(&["Let's disable the action! (disable-svgo-action)"]);
        assert_eq!(resolve(&c, None, &markers()), Disabled);
    }

    #[test]
    fn test_most_recent_marker_comment_wins() {
        let c = comments(&[
            "Thanks!",
            "In this comment we enable the action (enable-svgo-action)",
            "Some discussion",
            "In this comment we disable the action (disable-svgo-action)",
        ]);
        assert_eq!(resolve(&c, None, &markers()), Enabled);

        let c = comments(&[
            "No, I don't want the Action to run! disable-svgo-action",
            "In this comment we enable the action (enable-svgo-action)",
            "In this comment we disable the action (disable-svgo-action)",
        ]);
        assert_eq!(resolve(&c, None, &markers()), Disabled);
    }

    #[test]
    fn test_nearest_marker_bearing_comment_decides() {
        let c = comments(&["a", "disable-svgo-action", "enable-svgo-action", "b"]);
        assert_eq!(resolve(&c, None, &markers()), Disabled);
    }

    #[test]
    fn test_both_markers_in_one_comment_enable() {
        let c = comments(&["disable-svgo-action enable-svgo-action"]);
        assert_eq!(resolve(&c, None, &markers()), Enabled);

        // Order inside the text does not matter.
        let c = comments(&["enable-svgo-action, no wait, disable-svgo-action"]);
        assert_eq!(resolve(&c, None, &markers()), Enabled);
    }

    #[test]
    fn test_commit_disable_overrides_older_enable_comment() {
        let c = comments(&["unrelated", "enable-svgo-action"]);
        assert_eq!(
            resolve(&c, Some("Add logo\n\ndisable-svgo-action"), &markers()),
            Disabled
        );
    }

    #[test]
    fn test_commit_enable_overrides_disable_comment() {
        let c = comments(&["disable-svgo-action"]);
        assert_eq!(resolve(&c, None, &markers()), Disabled);
        assert_eq!(
            resolve(
                &c,
                Some("I don't know what I'm doing but enable-svgo-action"),
                &markers()
            ),
            Enabled
        );
    }

    #[test]
    fn test_commit_with_both_markers_enables() {
        let c = comments(&["disable-svgo-action"]);
        assert_eq!(
            resolve(
                &c,
                Some("disable-svgo-action then enable-svgo-action"),
                &markers()
            ),
            Enabled
        );
    }

    #[test]
    fn test_commit_without_markers_keeps_comment_verdict() {
        let c = comments(&["disable-svgo-action"]);
        assert_eq!(resolve(&c, Some("Fix typo"), &markers()), Disabled);
    }

    #[test]
    fn test_custom_markers() {
        let m = Markers {
            enable: "svgo:on".to_string(),
            disable: "svgo:off".to_string(),
        };
        assert_eq!(resolve(&comments(&["svgo:off"]), None, &m), Disabled);
        assert_eq!(
            resolve(&comments(&["disable-svgo-action"]), None, &m),
            Enabled
        );
    }
}

//! Action configuration.
//!
//! Built once per run from three layers, lowest precedence first: built-in
//! defaults, action inputs, and the YAML file in the repository. The result
//! is an immutable [`ActionConfig`] passed to every stage.

use serde::Deserialize;
use svgo_hosting::HostingApi;
use tracing::debug;

use crate::classify::IgnoreGlob;
use crate::domain::ConfigError;
use crate::encoder;
use crate::manual_control::Markers;
use crate::optimizer::{SvgoOptions, SvgoVersion, UnknownSvgoVersion};
use crate::summary::{DEFAULT_COMMENT, DEFAULT_COMMIT_BODY, DEFAULT_COMMIT_TITLE};
use crate::templating;

pub const DEFAULT_CONFIG_PATH: &str = ".github/svgo-action.yml";
pub const DEFAULT_SVGO_OPTIONS_PATH: &str = "svgo.config.js";
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Values supplied as action inputs. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInputs {
    pub dry_run: Option<bool>,
    pub ignore: Option<String>,
    pub comment: Option<String>,
    pub commit_title: Option<String>,
    pub commit_body: Option<String>,
    pub svgo_options: Option<String>,
    pub svgo_version: Option<String>,
    pub enable_marker: Option<String>,
    pub disable_marker: Option<String>,
    pub max_concurrency: Option<usize>,
}

/// `comment:` in YAML is either a switch or a template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommentValue {
    Flag(bool),
    Template(String),
}

/// A YAML scalar that may be written as a number or a string, e.g.
/// `svgo-version: 2` and `svgo-version: "2"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(u64),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

/// The repository configuration file as written. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RawConfig {
    pub dry_run: Option<bool>,
    pub ignore: Option<String>,
    pub comment: Option<CommentValue>,
    pub commit_title: Option<String>,
    pub commit_body: Option<String>,
    pub svgo_options: Option<String>,
    pub svgo_version: Option<Scalar>,
    pub enable_marker: Option<String>,
    pub disable_marker: Option<String>,
    pub max_concurrency: Option<usize>,
}

impl RawConfig {
    /// Parse the YAML text of `path`. An empty document yields defaults.
    pub fn parse(path: &str, text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::InvalidYaml {
            path: path.to_string(),
            source,
        })
    }
}

/// Resolved configuration of one run.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub dry_run: bool,
    pub ignore: Option<IgnoreGlob>,
    /// Comment template, `None` when commenting is off.
    pub comment: Option<String>,
    pub commit_title: String,
    pub commit_body: String,
    pub svgo_options_path: String,
    pub svgo_version: SvgoVersion,
    pub markers: Markers,
    pub max_concurrency: usize,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            ignore: None,
            comment: None,
            commit_title: DEFAULT_COMMIT_TITLE.to_string(),
            commit_body: DEFAULT_COMMIT_BODY.to_string(),
            svgo_options_path: DEFAULT_SVGO_OPTIONS_PATH.to_string(),
            svgo_version: SvgoVersion::default(),
            markers: Markers::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl ActionConfig {
    /// Layer `raw` over `inputs` over the defaults.
    pub fn resolve(inputs: &ActionInputs, raw: RawConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let input_comment = inputs.comment.as_deref().map(comment_from_input);
        let comment = match raw.comment {
            Some(CommentValue::Flag(false)) => None,
            Some(CommentValue::Flag(true)) => Some(DEFAULT_COMMENT.to_string()),
            Some(CommentValue::Template(template)) => comment_from_input(&template),
            None => input_comment.unwrap_or(defaults.comment),
        };

        let ignore = match non_empty(raw.ignore.or_else(|| inputs.ignore.clone())) {
            Some(pattern) => Some(IgnoreGlob::new(&pattern)?),
            None => None,
        };

        let svgo_version = match raw
            .svgo_version
            .map(Scalar::into_string)
            .or_else(|| inputs.svgo_version.clone())
        {
            Some(value) => value
                .parse::<SvgoVersion>()
                .map_err(|UnknownSvgoVersion(value)| ConfigError::InvalidValue {
                    key: "svgo-version".to_string(),
                    value,
                })?,
            None => defaults.svgo_version,
        };

        let max_concurrency = raw
            .max_concurrency
            .or(inputs.max_concurrency)
            .unwrap_or(defaults.max_concurrency);
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max-concurrency".to_string(),
                value: "0".to_string(),
            });
        }

        let markers = Markers {
            enable: non_empty(raw.enable_marker.or_else(|| inputs.enable_marker.clone()))
                .unwrap_or(defaults.markers.enable),
            disable: non_empty(raw.disable_marker.or_else(|| inputs.disable_marker.clone()))
                .unwrap_or(defaults.markers.disable),
        };

        let commit_title = raw
            .commit_title
            .or_else(|| inputs.commit_title.clone())
            .unwrap_or(defaults.commit_title);
        let commit_body = raw
            .commit_body
            .or_else(|| inputs.commit_body.clone())
            .unwrap_or(defaults.commit_body);
        check_template("commit-title", &commit_title)?;
        check_template("commit-body", &commit_body)?;
        if let Some(template) = &comment {
            check_template("comment", template)?;
        }

        Ok(Self {
            dry_run: raw.dry_run.or(inputs.dry_run).unwrap_or(defaults.dry_run),
            ignore,
            comment,
            commit_title,
            commit_body,
            svgo_options_path: non_empty(raw.svgo_options.or_else(|| inputs.svgo_options.clone()))
                .unwrap_or(defaults.svgo_options_path),
            svgo_version,
            markers,
            max_concurrency,
        })
    }

    /// Fetch the repository configuration at `git_ref` and resolve it.
    pub async fn load(
        api: &dyn HostingApi,
        inputs: &ActionInputs,
        config_path: &str,
        git_ref: &str,
    ) -> Result<Self, ConfigError> {
        let raw = load_raw_config(api, config_path, git_ref).await?;
        Self::resolve(inputs, raw)
    }
}

fn comment_from_input(value: &str) -> Option<String> {
    match value.trim() {
        "" | "false" => None,
        "true" => Some(DEFAULT_COMMENT.to_string()),
        _ => Some(value.to_string()),
    }
}

fn check_template(key: &str, template: &str) -> Result<(), ConfigError> {
    templating::validate(template).map_err(|source| ConfigError::InvalidTemplate {
        key: key.to_string(),
        source,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Text of `path` at `git_ref`, or `None` when the file does not exist.
async fn fetch_text(
    api: &dyn HostingApi,
    path: &str,
    git_ref: &str,
) -> Result<Option<String>, ConfigError> {
    let data = match api.get_file(path, git_ref).await {
        Ok(data) => data,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Fetch {
                path: path.to_string(),
                source,
            })
        }
    };
    encoder::decode(&data.content, data.encoding)
        .map(Some)
        .map_err(|source| ConfigError::Decode {
            path: path.to_string(),
            source,
        })
}

/// Load the repository configuration file. A missing file yields defaults.
pub async fn load_raw_config(
    api: &dyn HostingApi,
    path: &str,
    git_ref: &str,
) -> Result<RawConfig, ConfigError> {
    match fetch_text(api, path, git_ref).await? {
        Some(text) => RawConfig::parse(path, &text),
        None => {
            debug!("configuration file not found at {path}");
            Ok(RawConfig::default())
        }
    }
}

/// Load the optimizer options file. A missing file means engine defaults.
pub async fn load_svgo_options(
    api: &dyn HostingApi,
    path: &str,
    git_ref: &str,
) -> Result<Option<SvgoOptions>, ConfigError> {
    match fetch_text(api, path, git_ref).await? {
        Some(content) => Ok(Some(SvgoOptions {
            path: path.to_string(),
            content,
        })),
        None => {
            debug!("SVGO options not found at {path}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svgo_hosting::{fakes::MemoryHosting, Encoding, Operation};

    const REF: &str = "abc123";

    #[test]
    fn test_defaults() {
        let config = ActionConfig::resolve(&ActionInputs::default(), RawConfig::default()).unwrap();
        assert!(!config.dry_run);
        assert!(config.ignore.is_none());
        assert!(config.comment.is_none());
        assert_eq!(config.svgo_options_path, "svgo.config.js");
        assert_eq!(config.svgo_version, SvgoVersion::V2);
        assert_eq!(config.markers, Markers::default());
        assert_eq!(config.max_concurrency, 4);
    }

    #[test]
    fn test_repository_file_overrides_inputs() {
        let inputs = ActionInputs {
            dry_run: Some(true),
            ignore: Some("vendor/*".to_string()),
            svgo_version: Some("3".to_string()),
            ..Default::default()
        };
        let raw = RawConfig::parse(
            DEFAULT_CONFIG_PATH,
            "dry-run: false\nignore: icons/*\nsvgo-version: project\n",
        )
        .unwrap();

        let config = ActionConfig::resolve(&inputs, raw).unwrap();
        assert!(!config.dry_run);
        assert_eq!(config.ignore.unwrap().pattern(), "icons/*");
        assert_eq!(config.svgo_version, SvgoVersion::Project);
    }

    #[test]
    fn test_inputs_apply_without_repository_file() {
        let inputs = ActionInputs {
            dry_run: Some(true),
            comment: Some("true".to_string()),
            max_concurrency: Some(8),
            ..Default::default()
        };
        let config = ActionConfig::resolve(&inputs, RawConfig::default()).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.comment.as_deref(), Some(DEFAULT_COMMENT));
        assert_eq!(config.max_concurrency, 8);
    }

    #[test]
    fn test_comment_forms() {
        let raw = RawConfig::parse("c.yml", "comment: false").unwrap();
        let inputs = ActionInputs {
            comment: Some("true".to_string()),
            ..Default::default()
        };
        assert!(ActionConfig::resolve(&inputs, raw).unwrap().comment.is_none());

        let raw = RawConfig::parse("c.yml", "comment: \"Saved {{optimizedCount}}\"").unwrap();
        let config = ActionConfig::resolve(&ActionInputs::default(), raw).unwrap();
        assert_eq!(config.comment.as_deref(), Some("Saved {{optimizedCount}}"));

        let inputs = ActionInputs {
            comment: Some("false".to_string()),
            ..Default::default()
        };
        let config = ActionConfig::resolve(&inputs, RawConfig::default()).unwrap();
        assert!(config.comment.is_none());
    }

    #[test]
    fn test_numeric_svgo_version() {
        let raw = RawConfig::parse("c.yml", "svgo-version: 3").unwrap();
        let config = ActionConfig::resolve(&ActionInputs::default(), raw).unwrap();
        assert_eq!(config.svgo_version, SvgoVersion::V3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let inputs = ActionInputs {
            svgo_version: Some("foobar".to_string()),
            ..Default::default()
        };
        let err = ActionConfig::resolve(&inputs, RawConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "svgo-version"));

        let raw = RawConfig::parse("c.yml", "ignore: \"icons/[\"").unwrap();
        let err = ActionConfig::resolve(&ActionInputs::default(), raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob { .. }));

        let raw = RawConfig::parse("c.yml", "max-concurrency: 0").unwrap();
        let err = ActionConfig::resolve(&ActionInputs::default(), raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "max-concurrency"));
    }

    #[test]
    fn test_malformed_templates_are_rejected() {
        let raw = RawConfig::parse("c.yml", "comment: \"Saved {{#if}}\"").unwrap();
        let err = ActionConfig::resolve(&ActionInputs::default(), raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { ref key, .. } if key == "comment"));

        let inputs = ActionInputs {
            commit_title: Some("Optimize {{#each}} SVG(s)".to_string()),
            ..Default::default()
        };
        let err = ActionConfig::resolve(&inputs, RawConfig::default()).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidTemplate { ref key, .. } if key == "commit-title")
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let err = RawConfig::parse("c.yml", "dry-run: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidYaml { ref path, .. } if path == "c.yml"));
    }

    #[test]
    fn test_empty_file_and_unknown_keys() {
        assert_eq!(RawConfig::parse("c.yml", "\n").unwrap(), RawConfig::default());
        let raw = RawConfig::parse("c.yml", "some-future-key: 1\ndry-run: true").unwrap();
        assert_eq!(raw.dry_run, Some(true));
    }

    #[test]
    fn test_blank_ignore_input_is_unset() {
        let inputs = ActionInputs {
            ignore: Some("  ".to_string()),
            ..Default::default()
        };
        let config = ActionConfig::resolve(&inputs, RawConfig::default()).unwrap();
        assert!(config.ignore.is_none());
    }

    #[tokio::test]
    async fn test_missing_files_fall_back() {
        let api = MemoryHosting::new();
        let raw = load_raw_config(&api, DEFAULT_CONFIG_PATH, REF).await.unwrap();
        assert_eq!(raw, RawConfig::default());
        let options = load_svgo_options(&api, DEFAULT_SVGO_OPTIONS_PATH, REF)
            .await
            .unwrap();
        assert!(options.is_none());
    }

    #[tokio::test]
    async fn test_load_reads_repository_file() {
        let api = MemoryHosting::new();
        let yaml = encoder::encode("dry-run: true\ndisable-marker: svgo:off\n", Encoding::Base64);
        api.put_file(REF, DEFAULT_CONFIG_PATH, &yaml, Encoding::Base64);

        let config = ActionConfig::load(&api, &ActionInputs::default(), DEFAULT_CONFIG_PATH, REF)
            .await
            .unwrap();
        assert!(config.dry_run);
        assert_eq!(config.markers.disable, "svgo:off");
        assert_eq!(config.markers.enable, "enable-svgo-action");
    }

    #[tokio::test]
    async fn test_options_keep_their_path() {
        let api = MemoryHosting::new();
        api.put_file(REF, "svgo.config.js", "module.exports = {};", Encoding::Utf8);
        let options = load_svgo_options(&api, "svgo.config.js", REF)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(options.path, "svgo.config.js");
        assert_eq!(options.content, "module.exports = {};");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error() {
        let api = MemoryHosting::new();
        api.fail(Operation::GetFile);
        let err = load_raw_config(&api, DEFAULT_CONFIG_PATH, REF)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Fetch { .. }));
    }
}

use clap::{Parser, Subcommand};
use prodline_core::config::{ConfigOverrides, parse_policy};
use prodline_core::error::AppError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Track house units through the production line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a job from a house model
    ///
    /// Example: prodline create "Unit A" --model 79k --start-date 2025-03-03 --deadline 2025-03-20 --resp-user Somchai
    Create {
        name: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long = "start-date")]
        start_date: String,
        #[arg(long)]
        deadline: String,
        #[arg(long = "resp-user")]
        resp_user: Option<String>,
        #[arg(long, default_value = "draft")]
        status: String,
    },
    /// List every job
    ///
    /// Example: prodline list
    List,
    /// Show a job and its components
    ///
    /// Example: prodline show job-1
    Show { id: String },
    /// Set the job-level status
    ///
    /// Example: prodline status job-1 in-progress
    Status { id: String, status: String },
    /// Move a component to draft (pause), in-progress (start/resume) or done
    ///
    /// Example: prodline component job-1-c0 in-progress
    Component { id: String, status: String },
    /// Show one production line across all jobs
    ///
    /// Example: prodline line "Steel frame" --show-completed
    Line {
        name: String,
        #[arg(long = "show-completed")]
        show_completed: bool,
    },
    /// Show dashboard aggregates
    ///
    /// Example: prodline stats
    Stats,
    /// List the available house models
    ///
    /// Example: prodline models
    Models,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StartedAt,
    Transitions,
    NegativeTime,
    DefaultModel,
    RespUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (section, field) = key_raw
        .split_once('.')
        .map(|(section, rest)| (Some(section.trim()), rest.trim()))
        .unwrap_or((None, key_raw.trim()));

    if let Some(section) = section
        && canonicalize_flag_name(section).as_deref() != Some("tracker")
    {
        return Err(format!("unknown config section '{section}'"));
    }

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match (section.is_some(), canonical_field.as_str()) {
        (_, "started_at") => ConfigOverrideTarget::StartedAt,
        (_, "transitions") => ConfigOverrideTarget::Transitions,
        (_, "negative_time") => ConfigOverrideTarget::NegativeTime,
        (false, "default_model" | "model") => ConfigOverrideTarget::DefaultModel,
        (false, "resp_user") => ConfigOverrideTarget::RespUser,
        (_, other) => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override '{canonical_field}' needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` flag into one set of overrides; later flags win.
pub fn build_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::StartedAt => {
                overrides.started_at = Some(parse_policy(&parsed.value)?)
            }
            ConfigOverrideTarget::Transitions => {
                overrides.transitions = Some(parse_policy(&parsed.value)?)
            }
            ConfigOverrideTarget::NegativeTime => {
                overrides.negative_time = Some(parse_policy(&parsed.value)?)
            }
            ConfigOverrideTarget::DefaultModel => overrides.default_model = Some(parsed.value),
            ConfigOverrideTarget::RespUser => overrides.resp_user = Some(parsed.value),
        }
    }

    Ok(overrides)
}

/// Rewrites the interactive shortcuts `start|resume|pause|done <component-id>`
/// into the matching `component` command. Anything else passes through.
pub fn expand_status_shortcut(mut args: Vec<String>) -> Vec<String> {
    let status = match args.first().map(|verb| verb.to_ascii_lowercase()).as_deref() {
        Some("start" | "resume") => "in-progress",
        Some("pause") => "draft",
        Some("done" | "finish") => "done",
        _ => return args,
    };
    if args.len() < 2 {
        return args;
    }

    args[0] = "component".to_string();
    args.insert(2, status.to_string());
    args
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigOverrideTarget, build_overrides, expand_status_shortcut, parse_config_override,
    };
    use prodline_core::tracker::{NegativeTimePolicy, StartedAtPolicy, TransitionPolicy};

    #[test]
    fn parse_config_override_accepts_tracker_prefix() {
        let parsed = parse_config_override(" Tracker.Started-At = keep_first ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::StartedAt);
        assert_eq!(parsed.value, "keep_first");
    }

    #[test]
    fn parse_config_override_accepts_bare_fields() {
        let parsed = parse_config_override("resp-user = Somchai Jaidee").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::RespUser);
        assert_eq!(parsed.value, "Somchai Jaidee");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("tracker.speed=fast").unwrap_err();
        assert!(err.contains("unknown config field"));

        let err = parse_config_override("theme.accent=red").unwrap_err();
        assert!(err.contains("unknown config section"));

        let err = parse_config_override("tracker.default_model=79k").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals_or_value() {
        let err = parse_config_override("transitions").unwrap_err();
        assert!(err.contains("KEY=VALUE"));

        let err = parse_config_override("transitions= ").unwrap_err();
        assert!(err.contains("needs a value"));
    }

    #[test]
    fn build_overrides_parses_policies() {
        let raw = vec![
            "started_at=reset-on-every-start".to_string(),
            "tracker.transitions=lenient".to_string(),
            "negative_time=clamp".to_string(),
            "model=139k".to_string(),
        ];

        let overrides = build_overrides(&raw).unwrap();

        assert_eq!(overrides.started_at, Some(StartedAtPolicy::ResetOnEveryStart));
        assert_eq!(overrides.transitions, Some(TransitionPolicy::Lenient));
        assert_eq!(overrides.negative_time, Some(NegativeTimePolicy::Clamp));
        assert_eq!(overrides.default_model.as_deref(), Some("139k"));
    }

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn status_shortcuts_expand_to_component_command() {
        assert_eq!(
            expand_status_shortcut(words("Resume job-1-c0")),
            words("component job-1-c0 in-progress")
        );
        assert_eq!(
            expand_status_shortcut(words("pause job-1-c0 --json")),
            words("component job-1-c0 draft --json")
        );
        assert_eq!(
            expand_status_shortcut(words("finish job-1-c3")),
            words("component job-1-c3 done")
        );
    }

    #[test]
    fn status_shortcuts_leave_other_commands_alone() {
        assert_eq!(expand_status_shortcut(words("show job-1")), words("show job-1"));
        assert_eq!(expand_status_shortcut(words("start")), words("start"));
    }

    #[test]
    fn build_overrides_reports_bad_policy() {
        let err = build_overrides(&["transitions=loose".to_string()]).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}

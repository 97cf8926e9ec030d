use sara_domain::config::{Config, ConfigSeverity};

/// Render validation issues for `config validate`.
///
/// Returns the report and whether the config is usable (no errors;
/// warnings are allowed).
pub fn validation_report(config: &Config, config_path: &str) -> (String, bool) {
    let issues = config.validate();
    if issues.is_empty() {
        return (format!("Config OK ({config_path})\n"), true);
    }

    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    let warnings = issues.len() - errors;

    let mut report: String = issues.iter().map(|i| format!("{i}\n")).collect();
    report.push_str(&format!(
        "\n{errors} error(s), {warnings} warning(s) in {config_path}\n"
    ));
    (report, errors == 0)
}

/// The resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

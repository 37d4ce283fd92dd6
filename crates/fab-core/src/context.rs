use std::{fmt, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use fab_model::{Args, ConfigName, LOCALHOST, Vars};

use crate::{
    metrics::MetricsHandle,
    template::{TemplateError, render},
};

/// Template variable holding the bound configuration name.
pub const VAR_CONFIG: &str = "config";
/// Template variable holding the execution host.
pub const VAR_MACHINE_NAME: &str = "machine_name";
/// Template variable holding the requested core count.
pub const VAR_CORES: &str = "cores";

/// Default job-name template: `<config>_<machine>_<cores>`.
pub const DEFAULT_JOB_NAME_TEMPLATE: &str = "${config}_${machine_name}_${cores}";

/// Serializable settings an [`ExecContext`] is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Execution target; `localhost` means jobs run in-process and are never waited on.
    pub host: String,
    /// Template rendered into each job's result directory name.
    pub job_name_template: String,
    /// Root that fetched results are copied into.
    pub local_results: PathBuf,
    /// Root holding one directory per configuration.
    pub config_root: PathBuf,
    /// Extra template variables (`cores`, `job_hash`, ...).
    pub vars: Vars,
}

impl Default for ContextConfig {
    fn default() -> Self {
        let mut vars = Vars::new();
        vars.insert(VAR_CORES, "1");
        Self {
            host: LOCALHOST.to_string(),
            job_name_template: DEFAULT_JOB_NAME_TEMPLATE.to_string(),
            local_results: PathBuf::from("results"),
            config_root: PathBuf::from("config_files"),
            vars,
        }
    }
}

/// Execution context threaded through one task invocation.
///
/// Holds the values a task reads while it runs: the bound configuration,
/// the target host, the job-name template and the local results root.
/// Builders return a new value; nothing here is shared between invocations.
#[derive(Clone)]
pub struct ExecContext {
    config: Option<ConfigName>,
    host: String,
    job_name_template: String,
    local_results: PathBuf,
    config_root: PathBuf,
    vars: Vars,
    metrics: MetricsHandle,
}

impl ExecContext {
    /// Build a context from its serializable settings with a no-op metrics backend.
    pub fn from_config(cfg: ContextConfig) -> Self {
        Self {
            config: None,
            host: cfg.host,
            job_name_template: cfg.job_name_template,
            local_results: cfg.local_results,
            config_root: cfg.config_root,
            vars: cfg.vars,
            metrics: crate::metrics::noop_metrics(),
        }
    }

    /// Currently bound configuration, if any.
    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `true` when jobs run on the local machine.
    pub fn is_local(&self) -> bool {
        self.host == LOCALHOST
    }

    pub fn job_name_template(&self) -> &str {
        &self.job_name_template
    }

    pub fn local_results(&self) -> &Path {
        &self.local_results
    }

    pub fn config_root(&self) -> &Path {
        &self.config_root
    }

    /// Directory holding the input files of `config`.
    pub fn config_dir(&self, config: &str) -> PathBuf {
        self.config_root.join(config)
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Bind a configuration and return the updated context.
    pub fn with_config(mut self, config: impl Into<ConfigName>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_job_name_template(mut self, template: impl Into<String>) -> Self {
        self.job_name_template = template.into();
        self
    }

    pub fn with_local_results(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_results = dir.into();
        self
    }

    pub fn with_config_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_root = dir.into();
        self
    }

    /// Merge task overrides into the template variables.
    pub fn with_args(mut self, args: &Args) -> Self {
        self.vars.apply(args);
        self
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Variables visible to templates: user vars plus `config` and `machine_name`.
    pub fn template_vars(&self) -> Vars {
        let mut vars = self.vars.clone();
        vars.insert(VAR_MACHINE_NAME, self.host.as_str());
        if let Some(config) = &self.config {
            vars.insert(VAR_CONFIG, config.as_str());
        }
        vars
    }

    /// Render an arbitrary template against this context.
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        render(template, &self.template_vars())
    }

    /// Render the job-name template.
    pub fn job_name(&self) -> Result<String, TemplateError> {
        self.render(&self.job_name_template)
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::from_config(ContextConfig::default())
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("config", &self.config)
            .field("host", &self.host)
            .field("job_name_template", &self.job_name_template)
            .field("local_results", &self.local_results)
            .field("vars_len", &self.vars.len())
            .field("metrics", &"<handle>")
            .finish()
    }
}

impl fmt::Display for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecContext(config={}, host={})",
            self.config.as_deref().unwrap_or("-"),
            self.host
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_local_with_default_template() {
        let ctx = ExecContext::default();
        assert!(ctx.is_local());
        assert!(ctx.config().is_none());
        assert_eq!(ctx.job_name_template(), DEFAULT_JOB_NAME_TEMPLATE);
    }

    #[test]
    fn job_name_needs_a_bound_config() {
        let ctx = ExecContext::default();
        assert!(matches!(
            ctx.job_name(),
            Err(TemplateError::UnknownVar { name, .. }) if name == "config"
        ));

        let ctx = ctx.with_config("dummy_test");
        assert_eq!(ctx.job_name().unwrap(), "dummy_test_localhost_1");
    }

    #[test]
    fn args_feed_template_vars() {
        let ctx = ExecContext::default()
            .with_config("cylinder")
            .with_host("archer2")
            .with_args(&Args::new().with("cores", "256"));

        assert!(!ctx.is_local());
        assert_eq!(ctx.job_name().unwrap(), "cylinder_archer2_256");
    }

    #[test]
    fn rebinding_config_leaves_original_untouched() {
        let base = ExecContext::default().with_config("dummy_test");
        let redirected = base.clone().with_config("validation");

        assert_eq!(base.config(), Some("dummy_test"));
        assert_eq!(redirected.job_name().unwrap(), "validation_localhost_1");
    }

    #[test]
    fn config_dir_is_under_root() {
        let ctx = ExecContext::default().with_config_root("/plugins/FabLogo/config_files");
        assert_eq!(
            ctx.config_dir("dummy_test"),
            PathBuf::from("/plugins/FabLogo/config_files/dummy_test")
        );
    }

    #[test]
    fn context_config_deserializes_with_defaults() {
        let cfg: ContextConfig =
            serde_json::from_str(r#"{"host":"eagle","vars":{"cores":"8"}}"#).unwrap();
        let ctx = ExecContext::from_config(cfg).with_config("dummy_test");

        assert_eq!(ctx.host(), "eagle");
        assert_eq!(ctx.job_name().unwrap(), "dummy_test_eagle_8");
        assert_eq!(ctx.to_string(), "ExecContext(config=dummy_test, host=eagle)");
    }
}

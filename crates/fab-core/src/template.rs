//! `$name` / `${name}` placeholder rendering.
//!
//! Job names and result directories are described by templates such as
//! `${config}_${machine_name}_${cores}` and rendered against the variables of
//! an [`ExecContext`](crate::ExecContext). `$$` renders a literal `$`.
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use fab_model::Vars;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))",
    )
    .expect("placeholder pattern must compile")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template variable '{name}' in {template:?}")]
    UnknownVar { name: String, template: String },

    #[error("invalid placeholder at byte {position} in {template:?}")]
    Malformed { position: usize, template: String },
}

/// Render `template`, substituting every placeholder from `vars`.
///
/// Every referenced variable must exist; there is no partial substitution.
///
/// ```rust
/// # use fab_core::template::render;
/// # use fab_model::Vars;
/// let mut vars = Vars::new();
/// vars.insert("config", "dummy_test").insert("cores", "4");
/// assert_eq!(render("${config}_$cores", &vars).unwrap(), "dummy_test_4");
/// ```
pub fn render(template: &str, vars: &Vars) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        out.push_str(substitute(&caps, whole.start(), template, vars)?);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn substitute<'v>(
    caps: &Captures<'_>,
    position: usize,
    template: &str,
    vars: &'v Vars,
) -> Result<&'v str, TemplateError> {
    if caps.name("escaped").is_some() {
        return Ok("$");
    }
    let name = caps
        .name("named")
        .or_else(|| caps.name("braced"))
        .map(|m| m.as_str())
        .ok_or_else(|| TemplateError::Malformed {
            position,
            template: template.to_string(),
        })?;

    vars.get(name).ok_or_else(|| TemplateError::UnknownVar {
        name: name.to_string(),
        template: template.to_string(),
    })
}

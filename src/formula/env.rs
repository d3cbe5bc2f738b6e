//! `env` formula: export environment variables from the namespace `.rc`
//!
//! ```text
//! [editor]
//! formula = env
//! editor = vim
//! pager = less -R
//! ```
//!
//! yields `export EDITOR=vim` and `export PAGER='less -R'`.

use std::sync::LazyLock;

use regex::Regex;

use super::{Formula, FormulaContext, base};
use crate::error::Result;
use crate::manifest::template;

static VARIABLE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").ok());

#[derive(Debug, Default)]
pub struct EnvFormula;

impl EnvFormula {
    /// `export` lines for every non-shared option
    fn exports(ctx: &FormulaContext<'_>) -> String {
        let Some(config) = ctx.config() else {
            return String::new();
        };
        config
            .to_dict()
            .into_iter()
            .filter(|(key, _)| !base::SHARED_OPTIONS.contains(&key.as_str()))
            .map(|(key, value)| format!("export {}={}", key.to_uppercase(), template::escape(&value)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn add_exports(ctx: &mut FormulaContext<'_>) {
        let exports = Self::exports(ctx);
        ctx.directory.add_to_rc(&exports);
    }
}

impl Formula for EnvFormula {
    fn kind(&self) -> &'static str {
        "env"
    }

    fn validate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        let Some(config) = ctx.target else {
            return Ok(());
        };
        let invalid: Vec<String> = config
            .keys()
            .into_iter()
            .filter(|key| !base::SHARED_OPTIONS.contains(&key.as_str()))
            .filter(|key| {
                !VARIABLE_NAME
                    .as_ref()
                    .is_some_and(|re| re.is_match(key))
            })
            .collect();
        for key in invalid {
            ctx.log_error(format!("'{key}' is not a valid environment variable name"));
        }
        Ok(())
    }

    fn install(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::add_exports(ctx);
        base::install(ctx)
    }

    fn update(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::add_exports(ctx);
        base::update(ctx)
    }

    fn activate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::add_exports(ctx);
        base::activate(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::FormulaHarness;

    #[test]
    fn test_install_exports_uppercased_keys() {
        let mut harness = FormulaHarness::target_only(
            "[vars]\nformula = env\neditor = vim\npager = less -R\n",
            "vars",
        );
        EnvFormula.install(&mut harness.context()).unwrap();
        let rc = harness.directory.rc_contents();
        assert!(rc.contains("export EDITOR=vim\n"));
        assert!(rc.contains(&format!("export PAGER={}", template::escape("less -R"))));
        assert!(!rc.contains("FORMULA"));
    }

    #[test]
    fn test_values_are_substituted() {
        let mut harness = FormulaHarness::target_only(
            "[config]\nhome = /opt\n[vars]\nformula = env\ntool_home = %(config:home)s/tool\n",
            "vars",
        );
        EnvFormula.install(&mut harness.context()).unwrap();
        assert!(harness.directory.rc_contents().contains("export TOOL_HOME=/opt/tool"));
    }

    #[test]
    fn test_invalid_variable_name_is_error() {
        let mut harness =
            FormulaHarness::target_only("[vars]\nformula = env\nbad-name = 1\n", "vars");
        EnvFormula.validate(&mut harness.context()).unwrap();
        assert_eq!(harness.errors.len(), 1);
    }
}

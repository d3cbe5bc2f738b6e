//! Behavior shared by every formula
//!
//! Formulas call these from their own lifecycle methods the way a subclass
//! would defer to its parent.
//!
//! Shared options:
//! - `rc`: shell content added to the namespace `.rc` on install, update
//!   and activate
//! - `command`: shell command run on install, and on update when the
//!   feature's configuration changed
//! - `systems`: comma-separated allow-list of OS families
//! - `depends`, `inputs`, `formula`: consumed by the manifest and engine

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use super::FormulaContext;
use crate::error::{self, Result};

/// Options every formula accepts
pub const SHARED_OPTIONS: &[&str] = &["formula", "depends", "rc", "command", "systems", "inputs"];

/// Options never carried over from source to target by `resolve`
pub const NON_RESOLVABLE: &[&str] = SHARED_OPTIONS;

pub fn should_run(ctx: &FormulaContext<'_>) -> bool {
    match ctx.config().and_then(|c| c.raw("systems")) {
        Some(systems) => ctx.system.is_allowed(&systems),
        None => true,
    }
}

/// Check the target configuration's options
///
/// Missing required options are feature errors; unknown and deprecated
/// options only warn.
pub fn validate(
    ctx: &mut FormulaContext<'_>,
    required: &[&str],
    valid: &[&str],
    deprecated: &[(&str, &str)],
) {
    let Some(config) = ctx.target else {
        return;
    };

    for key in config.keys() {
        if let Some((_, hint)) = deprecated.iter().find(|(name, _)| *name == key) {
            warn!(feature = %ctx.name, option = %key, "Deprecated option: {hint}");
        } else if !SHARED_OPTIONS.contains(&key.as_str())
            && !required.contains(&key.as_str())
            && !valid.contains(&key.as_str())
        {
            warn!(feature = %ctx.name, option = %key, "Unused option");
        }
    }

    for key in required {
        if !config.has(key) {
            ctx.log_error(format!(
                "Required option {key} not present in feature {}",
                ctx.name
            ));
        }
    }
}

/// Carry over source keys the target does not set
///
/// An absent key means "inherit"; there is no way to clear a value.
pub fn resolve(ctx: &mut FormulaContext<'_>) {
    let (Some(source), Some(target)) = (ctx.source, ctx.target) else {
        return;
    };
    for key in source.keys() {
        if NON_RESOLVABLE.contains(&key.as_str()) || target.has(&key) {
            continue;
        }
        if let Some(value) = source.raw(&key) {
            debug!(feature = %ctx.name, option = %key, "carrying over option");
            target.set(&key, value);
        }
    }
}

/// Add `rc` content and run `command`
///
/// # Errors
///
/// Returns `CommandFailed` if `command` exits non-zero.
pub fn install(ctx: &mut FormulaContext<'_>) -> Result<()> {
    add_rc(ctx);
    if let Some(command) = ctx.option("command") {
        run_shell(&command, &install_cwd(ctx)?)?;
    }
    Ok(())
}

/// Re-add `rc` and rerun `command` when the configuration changed
///
/// # Errors
///
/// Returns `CommandFailed` if `command` exits non-zero.
pub fn update(ctx: &mut FormulaContext<'_>) -> Result<()> {
    if ctx.config_changed() {
        if let Some(command) = ctx.option("command") {
            run_shell(&command, &install_cwd(ctx)?)?;
        }
    }
    add_rc(ctx);
    Ok(())
}

/// # Errors
///
/// Never fails; formulas override this to clean up what they installed.
pub fn remove(_ctx: &mut FormulaContext<'_>) -> Result<()> {
    Ok(())
}

/// # Errors
///
/// Never fails.
pub fn activate(ctx: &mut FormulaContext<'_>) -> Result<()> {
    add_rc(ctx);
    Ok(())
}

/// # Errors
///
/// Never fails.
pub fn deactivate(_ctx: &mut FormulaContext<'_>) -> Result<()> {
    Ok(())
}

fn add_rc(ctx: &mut FormulaContext<'_>) {
    if let Some(rc) = ctx.option("rc") {
        ctx.directory.add_to_rc(&rc);
    }
}

/// Install directory, created on demand, used as the command working dir
fn install_cwd(ctx: &FormulaContext<'_>) -> Result<std::path::PathBuf> {
    let dir = ctx.install_directory();
    std::fs::create_dir_all(&dir).map_err(|e| error::fs::write_failed(&dir, &e))?;
    Ok(dir)
}

/// Run a command through the platform shell
///
/// Output is captured and logged; stderr is included in the error when the
/// command fails.
///
/// # Errors
///
/// Returns `CommandFailed` if the shell cannot be spawned or the command
/// exits non-zero.
pub fn run_shell(command: &str, cwd: &Path) -> Result<()> {
    debug!(command = %command, cwd = %cwd.display(), "running command");

    let mut process = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    let output = process
        .current_dir(cwd)
        .output()
        .map_err(|e| error::feature::command_failed(command, e.to_string()))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        debug!(command = %command, "{}", stdout.trim_end());
    }

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let status = match output.status.code() {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    };
    let status = if stderr.trim().is_empty() {
        status
    } else {
        format!("{status}: {}", stderr.trim())
    };
    Err(error::feature::command_failed(command, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::FormulaHarness;

    #[test]
    fn test_should_run_without_systems() {
        let mut harness = FormulaHarness::target_only("[a]\nformula = env\n", "a");
        assert!(should_run(&harness.context()));
    }

    #[test]
    fn test_should_run_respects_allow_list() {
        let mut harness =
            FormulaHarness::target_only("[a]\nformula = env\nsystems = plan9\n", "a");
        assert!(!should_run(&harness.context()));
    }

    #[test]
    fn test_validate_missing_required_is_error() {
        let mut harness = FormulaHarness::target_only("[a]\nformula = git\nextra = 1\n", "a");
        validate(&mut harness.context(), &["url"], &["branch"], &[]);
        assert_eq!(harness.errors.len(), 1);
        assert!(harness.errors[0].contains("url"));
    }

    #[test]
    fn test_validate_unused_and_deprecated_only_warn() {
        let mut harness =
            FormulaHarness::target_only("[a]\nformula = git\nurl = x\nold = 1\nstray = 2\n", "a");
        validate(&mut harness.context(), &["url"], &[], &[("old", "use new")]);
        assert!(harness.errors.is_empty());
    }

    #[test]
    fn test_resolve_carries_over_missing_keys() {
        let mut harness = FormulaHarness::pair(
            "[a]\nformula = git\nurl = x\nbranch = dev\nrc = echo hi\n",
            "[a]\nformula = git\nurl = y\n",
            "a",
        );
        resolve(&mut harness.context());

        let target = harness.target.as_ref().unwrap();
        assert_eq!(target.raw("url").as_deref(), Some("y"));
        assert_eq!(target.raw("branch").as_deref(), Some("dev"));
        assert_eq!(target.raw("rc"), None);
    }

    #[test]
    fn test_install_adds_rc() {
        let mut harness =
            FormulaHarness::target_only("[a]\nformula = env\nrc = export A=1\n", "a");
        install(&mut harness.context()).unwrap();
        assert!(harness.directory.rc_contents().contains("export A=1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_install_runs_command_in_install_dir() {
        let mut harness =
            FormulaHarness::target_only("[a]\nformula = env\ncommand = touch marker\n", "a");
        install(&mut harness.context()).unwrap();
        assert!(harness.directory.install_directory("a").join("marker").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_update_skips_command_when_unchanged() {
        let text = "[a]\nformula = env\ncommand = touch marker\n";
        let mut harness = FormulaHarness::pair(text, text, "a");
        update(&mut harness.context()).unwrap();
        assert!(!harness.directory.install_directory("a").join("marker").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_shell_reports_failure() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = run_shell("echo boom >&2; exit 3", temp.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("status 3"));
        assert!(message.contains("boom"));
    }
}

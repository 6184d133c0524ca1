use crate::crypto::secure_rng::random_token;
use crate::error::{EraseError, EraseResult, SecureEraseStep};
use crate::{CancelToken, EraseReport, TargetKind};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Random bytes behind the temporary ATA user password
const PASSWORD_BYTES: usize = 16;

/// Drive-level secure erase, as exposed by the ATA security feature set.
///
/// Implementations talk to hardware; tests use the generated mock.
#[cfg_attr(test, mockall::automock)]
pub trait SecureEraseUnit: Send + Sync {
    /// Fail if the drive cannot run a security erase right now
    fn preflight(&self, device: &Path) -> Result<()>;

    fn set_password(&self, device: &Path, password: &str) -> Result<()>;

    /// Issue SECURITY ERASE UNIT; blocks until the drive reports completion
    fn erase_unit(&self, device: &Path, password: &str) -> Result<()>;

    fn clear_password(&self, device: &Path, password: &str) -> Result<()>;
}

/// Security section of `hdparm -I`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityState {
    pub supported: bool,
    pub enabled: bool,
    pub frozen: bool,
    pub enhanced_erase: bool,
}

impl SecurityState {
    /// Parse `hdparm -I` output. A negated line such as `not	frozen` does
    /// not set the flag.
    pub fn parse(identify: &str) -> Self {
        let mut state = SecurityState::default();
        let mut in_security = false;

        for raw in identify.lines() {
            if raw.trim_start().starts_with("Security:") {
                in_security = true;
                continue;
            }
            if in_security && !raw.starts_with('\t') && !raw.starts_with(' ') && !raw.is_empty() {
                break;
            }
            if !in_security {
                continue;
            }

            let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            match line.as_str() {
                "supported" => state.supported = true,
                "enabled" => state.enabled = true,
                "frozen" => state.frozen = true,
                "supported: enhanced erase" => state.enhanced_erase = true,
                _ => {}
            }
        }
        state
    }
}

/// `SecureEraseUnit` backed by the `hdparm` binary
#[derive(Debug, Clone)]
pub struct HdparmSecureErase {
    program: PathBuf,
}

impl Default for HdparmSecureErase {
    fn default() -> Self {
        Self {
            program: PathBuf::from("hdparm"),
        }
    }
}

impl HdparmSecureErase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str], device: &Path) -> Result<Output> {
        let output = Command::new(&self.program)
            .args(args)
            .arg(device)
            .output()
            .with_context(|| format!("failed to run {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            ));
        }
        Ok(output)
    }

    fn security_command(&self, flag: &str, device: &Path, password: &str) -> Result<()> {
        self.run(&["--user-master", "u", flag, password], device)?;
        Ok(())
    }
}

impl SecureEraseUnit for HdparmSecureErase {
    fn preflight(&self, device: &Path) -> Result<()> {
        let output = self.run(&["-I"], device)?;
        let state = SecurityState::parse(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(device = %device.display(), ?state, "ATA security state");

        if !state.supported {
            return Err(anyhow!("drive does not support the ATA security feature set"));
        }
        if state.frozen {
            return Err(anyhow!(
                "drive security is frozen; suspend/resume or power-cycle the drive and retry"
            ));
        }
        if state.enabled {
            return Err(anyhow!("a user password is already set on the drive"));
        }
        Ok(())
    }

    fn set_password(&self, device: &Path, password: &str) -> Result<()> {
        self.security_command("--security-set-pass", device, password)
    }

    fn erase_unit(&self, device: &Path, password: &str) -> Result<()> {
        self.security_command("--security-erase", device, password)
    }

    fn clear_password(&self, device: &Path, password: &str) -> Result<()> {
        self.security_command("--security-disable", device, password)
    }
}

/// The SSD strategy: preflight, set a fresh temporary password, erase.
pub struct SsdWipe;

impl SsdWipe {
    pub fn run(
        unit: &dyn SecureEraseUnit,
        device: &Path,
        cancel: &CancelToken,
    ) -> EraseResult<EraseReport> {
        let failed = |step: SecureEraseStep, err: anyhow::Error| EraseError::SecureEraseFailed {
            device: device.to_path_buf(),
            step,
            reason: format!("{:#}", err),
        };

        if cancel.is_cancelled() {
            return Err(cancelled(device));
        }

        unit.preflight(device)
            .map_err(|e| failed(SecureEraseStep::Preflight, e))?;

        let password = random_token(PASSWORD_BYTES)
            .map_err(|e| failed(SecureEraseStep::SetPassword, e.into()))?;

        tracing::info!(device = %device.display(), "Setting temporary security password");
        if let Err(e) = unit.set_password(device, &password) {
            Self::clear_best_effort(unit, device, &password);
            return Err(failed(SecureEraseStep::SetPassword, e));
        }

        if cancel.is_cancelled() {
            Self::clear_best_effort(unit, device, &password);
            return Err(cancelled(device));
        }

        tracing::info!(device = %device.display(), "Issuing security erase unit");
        if let Err(e) = unit.erase_unit(device, &password) {
            Self::clear_best_effort(unit, device, &password);
            return Err(failed(SecureEraseStep::EraseUnit, e));
        }

        // A completed erase unit leaves the security feature disabled
        tracing::info!(device = %device.display(), "Secure erase completed");
        Ok(EraseReport {
            passes_completed: 1,
            ..EraseReport::empty(TargetKind::SSD)
        })
    }

    fn clear_best_effort(unit: &dyn SecureEraseUnit, device: &Path, password: &str) {
        if let Err(e) = unit.clear_password(device, password) {
            tracing::warn!(
                device = %device.display(),
                error = %format!("{:#}", e),
                "Could not clear temporary security password; the drive may stay locked"
            );
        }
    }
}

fn cancelled(device: &Path) -> EraseError {
    EraseError::WipeCancelled {
        path: device.to_path_buf(),
        passes_completed: 0,
    }
}

//! Provisioning: installing the packages a provider requires.
//!
//! Instantiating a provider never touches the environment. Installing its
//! requirements is a separate, explicit step driven by [`Provisioner`].

use std::{collections::HashMap, path::PathBuf};

use {
    async_trait::async_trait,
    tessera_config::InstallerConfig,
    tracing::{debug, info},
};

use crate::error::{Error, Result};

/// Lists and installs packages in the host environment.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Installed packages: normalized name → version.
    async fn installed(&self) -> Result<HashMap<String, String>>;

    /// Install one requirement, blocking until the installer exits.
    async fn install(&self, requirement: &str) -> Result<()>;
}

/// Installer backed by an external program such as `pip`.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    install_args: Vec<String>,
    list_args: Vec<String>,
}

impl CommandInstaller {
    pub fn new(
        program: impl Into<String>,
        install_args: Vec<String>,
        list_args: Vec<String>,
    ) -> Self {
        Self {
            program: program.into(),
            install_args,
            list_args,
        }
    }

    pub fn from_config(config: &InstallerConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.install_args.clone(),
            config.list_args.clone(),
        )
    }

    /// User-visible rendering of the install command for `requirement`.
    pub fn install_command_preview(&self, requirement: &str) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.install_args.iter().map(String::as_str))
            .chain(std::iter::once(requirement))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| Error::InstallerNotFound {
            program: self.program.clone(),
        })
    }
}

impl Default for CommandInstaller {
    fn default() -> Self {
        Self::from_config(&InstallerConfig::default())
    }
}

#[async_trait]
impl PackageInstaller for CommandInstaller {
    async fn installed(&self) -> Result<HashMap<String, String>> {
        let program = self.resolve_program()?;
        let output = tokio::process::Command::new(&program)
            .args(&self.list_args)
            .output()
            .await
            .map_err(|e| Error::external(format!("failed to run {}", self.program), e))?;

        if !output.status.success() {
            return Err(Error::message(format!(
                "{} {} exited with {}: {}",
                self.program,
                self.list_args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_installed(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn install(&self, requirement: &str) -> Result<()> {
        let program = self.resolve_program()?;
        info!(command = %self.install_command_preview(requirement), "installing requirement");

        let status = tokio::process::Command::new(&program)
            .args(&self.install_args)
            .arg(requirement)
            .status()
            .await
            .map_err(|e| Error::external(format!("failed to run {}", self.program), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::InstallFailed {
                package: requirement.to_string(),
                code: status.code(),
            })
        }
    }
}

/// Parse `name==version` lines (pip freeze format) into normalized name →
/// version. Direct references (`name @ url`) map to an empty version.
pub fn parse_installed(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let (name, version) = match line.split_once("==") {
                Some((name, version)) => (name, version.trim()),
                None => (line.split_once(" @ ").map_or(line, |(name, _)| name), ""),
            };
            let name = normalize_name(name);
            (!name.is_empty()).then(|| (name, version.to_string()))
        })
        .collect()
}

/// Package name of a requirement string, without extras, version specifiers
/// or environment markers (`"Requests[socks]>=2.0"` → `"Requests"`).
pub fn requirement_name(requirement: &str) -> &str {
    let requirement = requirement.trim();
    let end = requirement
        .find(|c: char| "<>=!~;[@(,".contains(c) || c.is_whitespace())
        .unwrap_or(requirement.len());
    &requirement[..end]
}

/// Normalized package name: lower-case, with runs of `-`, `_` and `.`
/// collapsed to a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            pending_sep = !out.is_empty();
            continue;
        }
        if pending_sep {
            out.push('-');
            pending_sep = false;
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Requirements split by whether they are already installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl ProvisionPlan {
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub already_present: Vec<String>,
    pub installed: Vec<String>,
}

/// Installs whatever a requirement list is missing.
pub struct Provisioner<'a> {
    installer: &'a dyn PackageInstaller,
}

impl<'a> Provisioner<'a> {
    pub fn new(installer: &'a dyn PackageInstaller) -> Self {
        Self { installer }
    }

    /// Check requirements against the installed set without installing.
    ///
    /// Duplicates (after normalization) are dropped, first occurrence wins.
    pub async fn plan(&self, requirements: &[String]) -> Result<ProvisionPlan> {
        let installed = self.installer.installed().await?;
        let mut seen = Vec::new();
        let mut plan = ProvisionPlan::default();

        for requirement in requirements {
            let key = normalize_name(requirement_name(requirement));
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            if installed.contains_key(&key) {
                plan.present.push(requirement.clone());
            } else {
                plan.missing.push(requirement.clone());
            }
            seen.push(key);
        }

        debug!(present = ?plan.present, missing = ?plan.missing, "provision plan");
        Ok(plan)
    }

    /// Install every missing requirement, one installer run per package.
    ///
    /// Stops at the first failure; packages installed before it stay installed.
    pub async fn provision(&self, requirements: &[String]) -> Result<ProvisionReport> {
        let plan = self.plan(requirements).await?;
        let mut report = ProvisionReport {
            already_present: plan.present,
            installed: Vec::with_capacity(plan.missing.len()),
        };

        for requirement in plan.missing {
            self.installer.install(&requirement).await?;
            info!(%requirement, "requirement installed");
            report.installed.push(requirement);
        }

        Ok(report)
    }
}

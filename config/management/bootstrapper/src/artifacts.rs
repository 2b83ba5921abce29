// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime artifact and CorDapp reconciliation.
//!
//! Planning functions only read; the `install_*` and `copy_*` functions write and are
//! called once every check of a run has passed.

use crate::{
    constants::{
        CONTRACTS_MANIFEST_EXTENSION, CORDAPPS_DIR, CORDAPP_EXTENSION, EXCLUDE_WHITELIST_FILE,
        RUNTIME_ARTIFACT,
    },
    error::{io_error, Error},
};
use netboot_crypto::HashValue;
use slog::{debug, info, Logger};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// When staged CorDapps are copied into the node directories.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CopyCordapps {
    Always,
    /// Only while no node directory holds network parameters yet.
    FirstRunOnly,
    No,
}

impl CopyCordapps {
    pub const VARIANTS: [&'static str; 3] = ["always", "first_run_only", "no"];

    pub fn should_copy(self, first_run: bool) -> bool {
        match self {
            CopyCordapps::Always => true,
            CopyCordapps::FirstRunOnly => first_run,
            CopyCordapps::No => false,
        }
    }
}

impl Default for CopyCordapps {
    fn default() -> Self {
        CopyCordapps::FirstRunOnly
    }
}

impl FromStr for CopyCordapps {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "always" | "yes" => Ok(CopyCordapps::Always),
            "first_run_only" | "firstrunonly" => Ok(CopyCordapps::FirstRunOnly),
            "no" | "never" => Ok(CopyCordapps::No),
            _ => Err(Error::InvalidSettings(format!(
                "copy_cordapps must be one of {}, was {:?}",
                CopyCordapps::VARIANTS.join(", "),
                s
            ))),
        }
    }
}

impl fmt::Display for CopyCordapps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CopyCordapps::Always => CopyCordapps::VARIANTS[0],
            CopyCordapps::FirstRunOnly => CopyCordapps::VARIANTS[1],
            CopyCordapps::No => CopyCordapps::VARIANTS[2],
        };
        write!(f, "{}", name)
    }
}

/// Finds the contract classes a CorDapp implements.
pub trait ContractsScanner {
    fn contract_classes(&self, cordapp: &Path) -> Result<Vec<String>, Error>;
}

/// Reads the `<cordapp>.contracts` sidecar: one class name per line, `#` starts a
/// comment. A CorDapp without a sidecar declares no contracts.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManifestContractsScanner;

impl ContractsScanner for ManifestContractsScanner {
    fn contract_classes(&self, cordapp: &Path) -> Result<Vec<String>, Error> {
        let manifest = manifest_path(cordapp);
        if !manifest.is_file() {
            return Ok(vec![]);
        }
        let text = fs::read_to_string(&manifest).map_err(io_error(&manifest))?;
        let mut classes = vec![];
        for line in text.lines() {
            let class = line.split('#').next().unwrap_or_default().trim();
            if !class.is_empty() && !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
        Ok(classes)
    }
}

pub fn manifest_path(cordapp: &Path) -> PathBuf {
    let mut name = cordapp.as_os_str().to_os_string();
    name.push(".");
    name.push(CONTRACTS_MANIFEST_EXTENSION);
    PathBuf::from(name)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cordapp {
    pub path: PathBuf,
    pub hash: HashValue,
    pub contracts: Vec<String>,
}

impl Cordapp {
    pub fn load(path: PathBuf, scanner: &dyn ContractsScanner) -> Result<Cordapp, Error> {
        Ok(Cordapp {
            hash: hash_file(&path)?,
            contracts: scanner.contract_classes(&path)?,
            path,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn hash_file(path: &Path) -> Result<HashValue, Error> {
    let file = fs::File::open(path).map_err(io_error(path))?;
    HashValue::sha256_of_reader(file).map_err(io_error(path))
}

fn list_cordapps(dir: &Path, scanner: &dyn ContractsScanner) -> Result<Vec<Cordapp>, Error> {
    if !dir.is_dir() {
        return Ok(vec![]);
    }
    let mut paths = vec![];
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        let is_jar = path
            .extension()
            .map_or(false, |extension| extension == CORDAPP_EXTENSION);
        let is_runtime = path
            .file_name()
            .map_or(false, |name| name == RUNTIME_ARTIFACT);
        if is_jar && !is_runtime && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    paths
        .into_iter()
        .map(|path| Cordapp::load(path, scanner))
        .collect()
}

/// CorDapps staged directly under the root, by file name.
pub fn staged_cordapps(root: &Path, scanner: &dyn ContractsScanner) -> Result<Vec<Cordapp>, Error> {
    list_cordapps(root, scanner)
}

/// CorDapps already installed in a node directory.
pub fn node_cordapps(node: &Path, scanner: &dyn ContractsScanner) -> Result<Vec<Cordapp>, Error> {
    list_cordapps(&node.join(CORDAPPS_DIR), scanner)
}

/// Contract class to implementation hashes, in first-seen order. CorDapps with equal
/// content count once.
pub fn contract_implementations<'a, I>(cordapps: I) -> BTreeMap<String, Vec<HashValue>>
where
    I: IntoIterator<Item = &'a Cordapp>,
{
    let mut seen = BTreeSet::new();
    let mut implementations: BTreeMap<String, Vec<HashValue>> = BTreeMap::new();
    for cordapp in cordapps {
        if !seen.insert(cordapp.hash) {
            continue;
        }
        for contract in &cordapp.contracts {
            let hashes = implementations.entry(contract.clone()).or_default();
            if !hashes.contains(&cordapp.hash) {
                hashes.push(cordapp.hash);
            }
        }
    }
    implementations
}

/// Contract classes listed in the root's exclusion file, which are never added to the
/// whitelist.
pub fn whitelist_exclusions(root: &Path) -> Result<BTreeSet<String>, Error> {
    let path = root.join(EXCLUDE_WHITELIST_FILE);
    if !path.is_file() {
        return Ok(BTreeSet::new());
    }
    let text = fs::read_to_string(&path).map_err(io_error(&path))?;
    Ok(text
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Copies CorDapps and their sidecars into `<node>/cordapps`, verifying each copy.
pub fn copy_cordapps(cordapps: &[Cordapp], node: &Path, logger: &Logger) -> Result<(), Error> {
    if cordapps.is_empty() {
        return Ok(());
    }
    let target_dir = node.join(CORDAPPS_DIR);
    fs::create_dir_all(&target_dir).map_err(io_error(&target_dir))?;
    for cordapp in cordapps {
        let target = target_dir.join(cordapp.file_name());
        if target.is_file() && hash_file(&target)? == cordapp.hash {
            debug!(logger, "CorDapp already installed"; "cordapp" => %target.display());
        } else {
            copy_verified(&cordapp.path, &target, cordapp.hash)?;
            info!(logger, "Copied CorDapp"; "cordapp" => %target.display());
        }
        let manifest = manifest_path(&cordapp.path);
        if manifest.is_file() {
            let target_manifest = manifest_path(&target);
            fs::copy(&manifest, &target_manifest).map_err(io_error(&target_manifest))?;
        }
    }
    Ok(())
}

fn copy_verified(source: &Path, target: &Path, expected: HashValue) -> Result<(), Error> {
    fs::copy(source, target).map_err(io_error(target))?;
    let copied = hash_file(target)?;
    if copied != expected {
        return Err(Error::ArtifactConsistency {
            subject: target.display().to_string(),
            reason: format!(
                "copy of {} has hash {}, expected {}",
                source.display(),
                copied,
                expected
            ),
        });
    }
    Ok(())
}

/// Where a node gets its runtime artifact from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ArtifactSource {
    /// The node directory already has one, which is never replaced.
    NodeLocal,
    /// The root-level artifact.
    Root,
    /// Bytes supplied by the caller, materialized at the root for the run.
    Fallback,
}

#[derive(Clone, Debug)]
pub struct RuntimeArtifactPlan {
    root: PathBuf,
    nodes: Vec<(PathBuf, ArtifactSource)>,
}

/// Decides, for every node directory, where its runtime artifact comes from.
pub fn plan_runtime_artifacts(
    root: &Path,
    node_directories: &[PathBuf],
    fallback_available: bool,
) -> Result<RuntimeArtifactPlan, Error> {
    let root_artifact = root.join(RUNTIME_ARTIFACT);
    let root_available = check_regular_file(&root_artifact)?;
    let mut nodes = vec![];
    for directory in node_directories {
        let source = if check_regular_file(&directory.join(RUNTIME_ARTIFACT))? {
            ArtifactSource::NodeLocal
        } else if root_available {
            ArtifactSource::Root
        } else if fallback_available {
            ArtifactSource::Fallback
        } else {
            return Err(Error::ArtifactConsistency {
                subject: directory.display().to_string(),
                reason: format!("no {} in the node directory or the root", RUNTIME_ARTIFACT),
            });
        };
        nodes.push((directory.clone(), source));
    }
    Ok(RuntimeArtifactPlan {
        root: root.to_path_buf(),
        nodes,
    })
}

fn check_regular_file(path: &Path) -> Result<bool, Error> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(true),
        Ok(_) => Err(Error::ArtifactConsistency {
            subject: path.display().to_string(),
            reason: "exists but is not a regular file".to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::IO(path.display().to_string(), e)),
    }
}

impl RuntimeArtifactPlan {
    pub fn source_of(&self, directory: &Path) -> Option<&ArtifactSource> {
        self.nodes
            .iter()
            .find(|(d, _)| d == directory)
            .map(|(_, source)| source)
    }

    fn needs_fallback(&self) -> bool {
        self.nodes
            .iter()
            .any(|(_, source)| *source == ArtifactSource::Fallback)
    }

    /// Puts a runtime artifact in every node directory that lacks one. The returned guard
    /// removes a materialized fallback from the root when dropped.
    pub fn install(
        &self,
        fallback: Option<&[u8]>,
        logger: &Logger,
    ) -> Result<Option<FallbackArtifactGuard>, Error> {
        let root_artifact = self.root.join(RUNTIME_ARTIFACT);
        let guard = match (self.needs_fallback(), fallback) {
            (true, Some(bytes)) => {
                fs::write(&root_artifact, bytes).map_err(io_error(&root_artifact))?;
                info!(logger, "Materialized fallback runtime artifact"; "path" => %root_artifact.display());
                Some(FallbackArtifactGuard {
                    path: root_artifact.clone(),
                    logger: logger.clone(),
                })
            }
            (true, None) => {
                return Err(Error::ArtifactConsistency {
                    subject: root_artifact.display().to_string(),
                    reason: "no fallback runtime artifact was supplied".to_string(),
                })
            }
            (false, _) => None,
        };

        let mut source_hash = None;
        for (directory, source) in &self.nodes {
            if *source == ArtifactSource::NodeLocal {
                continue;
            }
            let expected = match source_hash {
                Some(hash) => hash,
                None => {
                    let hash = hash_file(&root_artifact)?;
                    source_hash = Some(hash);
                    hash
                }
            };
            fs::create_dir_all(directory).map_err(io_error(directory))?;
            let target = directory.join(RUNTIME_ARTIFACT);
            copy_verified(&root_artifact, &target, expected)?;
            info!(logger, "Installed runtime artifact"; "path" => %target.display());
        }
        Ok(guard)
    }
}

/// Removes the fallback runtime artifact from the root when the run ends, however it
/// ends.
#[derive(Debug)]
pub struct FallbackArtifactGuard {
    path: PathBuf,
    logger: Logger,
}

impl Drop for FallbackArtifactGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(self.logger, "Removed fallback runtime artifact"; "path" => %self.path.display()),
            Err(e) => slog::warn!(
                self.logger,
                "Failed to remove fallback runtime artifact";
                "path" => %self.path.display(),
                "error" => %e
            ),
        }
    }
}

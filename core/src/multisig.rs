//! Multisig permission model
//!
//! A permission is a tree of signature, script and time leaves combined by
//! `AllOf`, `AnyOf` and `AtLeast`. Resolving a permission flattens it into
//! the key hashes that must sign, plus the time bounds the transaction's
//! validity window has to respect. For `AnyOf`/`AtLeast` nodes the caller
//! chooses which branches it will satisfy through a [`BranchSelector`].

use crate::error::{ConfigurationError, InvariantViolation, Result};
use crate::transaction::ValidityWindow;
use crate::utxo::{KeyHash, ScriptHash, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Recursive authorization expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MultisigScript {
    Signature { key_hash: KeyHash },
    Script { script_hash: ScriptHash },
    AtLeast { required: u32, scripts: Vec<MultisigScript> },
    AllOf { scripts: Vec<MultisigScript> },
    AnyOf { scripts: Vec<MultisigScript> },
    Before { time: Timestamp },
    After { time: Timestamp },
}

impl MultisigScript {
    pub fn signature(key_hash: KeyHash) -> Self {
        MultisigScript::Signature { key_hash }
    }

    pub fn all_of(scripts: Vec<MultisigScript>) -> Self {
        MultisigScript::AllOf { scripts }
    }

    pub fn any_of(scripts: Vec<MultisigScript>) -> Self {
        MultisigScript::AnyOf { scripts }
    }

    pub fn at_least(required: u32, scripts: Vec<MultisigScript>) -> Self {
        MultisigScript::AtLeast { required, scripts }
    }

    /// Check the structural invariants of the whole tree.
    ///
    /// Empty `AllOf`/`AnyOf` lists are rejected rather than given a
    /// vacuous meaning.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        self.validate_at(&mut Vec::new())
    }

    fn validate_at(&self, path: &mut Vec<usize>) -> std::result::Result<(), ConfigurationError> {
        let scripts = match self {
            MultisigScript::AllOf { scripts } | MultisigScript::AnyOf { scripts } => {
                if scripts.is_empty() {
                    return Err(ConfigurationError::EmptyScriptList {
                        kind: self.kind(),
                        path: path_label(path),
                    });
                }
                scripts
            }
            MultisigScript::AtLeast { required, scripts } => {
                if *required as usize > scripts.len() {
                    return Err(ConfigurationError::ThresholdTooHigh {
                        required: *required,
                        available: scripts.len(),
                        path: path_label(path),
                    });
                }
                scripts
            }
            _ => return Ok(()),
        };

        for (index, script) in scripts.iter().enumerate() {
            path.push(index);
            script.validate_at(path)?;
            path.pop();
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        match self {
            MultisigScript::Signature { .. } => "signature",
            MultisigScript::Script { .. } => "script",
            MultisigScript::AtLeast { .. } => "at_least",
            MultisigScript::AllOf { .. } => "all_of",
            MultisigScript::AnyOf { .. } => "any_of",
            MultisigScript::Before { .. } => "before",
            MultisigScript::After { .. } => "after",
        }
    }

    /// Whether `keys` alone can satisfy this permission.
    ///
    /// Time leaves are assumed satisfiable; script leaves are not, since
    /// their logic lives outside this crate.
    pub fn satisfiable_by(&self, keys: &BTreeSet<KeyHash>) -> bool {
        match self {
            MultisigScript::Signature { key_hash } => keys.contains(key_hash),
            MultisigScript::Script { .. } => false,
            MultisigScript::Before { .. } | MultisigScript::After { .. } => true,
            MultisigScript::AllOf { scripts } => {
                !scripts.is_empty() && scripts.iter().all(|s| s.satisfiable_by(keys))
            }
            MultisigScript::AnyOf { scripts } => scripts.iter().any(|s| s.satisfiable_by(keys)),
            MultisigScript::AtLeast { required, scripts } => {
                scripts.iter().filter(|s| s.satisfiable_by(keys)).count() >= *required as usize
            }
        }
    }
}

/// A request for the caller to pick branches of an `AnyOf`/`AtLeast` node
#[derive(Debug)]
pub struct SelectionRequest<'a> {
    /// Name of the permission being resolved (e.g. `fund`, `vendor`)
    pub permission: &'a str,
    /// Position of the node in the tree, as child indices from the root
    pub path: &'a [usize],
    pub scripts: &'a [MultisigScript],
    /// Minimum number of branches that must be chosen
    pub required: usize,
}

/// Chooses which sub-policies the transaction will satisfy
pub trait BranchSelector {
    fn select(&mut self, request: &SelectionRequest<'_>) -> Result<Vec<usize>>;
}

/// Picks the first `required` branches
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstBranches;

impl BranchSelector for FirstBranches {
    fn select(&mut self, request: &SelectionRequest<'_>) -> Result<Vec<usize>> {
        Ok((0..request.required).collect())
    }
}

/// Explicit selections keyed by permission name and node path
#[derive(Debug, Default, Clone)]
pub struct PresetSelection {
    choices: HashMap<(String, Vec<usize>), Vec<usize>>,
}

impl PresetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose `branches` for the node at `path` of `permission`
    pub fn choose(mut self, permission: &str, path: &[usize], branches: &[usize]) -> Self {
        self.choices
            .insert((permission.to_string(), path.to_vec()), branches.to_vec());
        self
    }
}

impl BranchSelector for PresetSelection {
    fn select(&mut self, request: &SelectionRequest<'_>) -> Result<Vec<usize>> {
        self.choices
            .get(&(request.permission.to_string(), request.path.to_vec()))
            .cloned()
            .ok_or_else(|| {
                ConfigurationError::SelectionUnavailable {
                    permission: request.permission.to_string(),
                    path: path_label(request.path),
                }
                .into()
            })
    }
}

/// Picks the first branches a known set of keys can fully satisfy
#[derive(Debug, Default, Clone)]
pub struct KeyringSelector {
    keys: BTreeSet<KeyHash>,
}

impl KeyringSelector {
    pub fn new(keys: impl IntoIterator<Item = KeyHash>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl BranchSelector for KeyringSelector {
    fn select(&mut self, request: &SelectionRequest<'_>) -> Result<Vec<usize>> {
        let chosen: Vec<usize> = request
            .scripts
            .iter()
            .enumerate()
            .filter(|(_, script)| script.satisfiable_by(&self.keys))
            .map(|(index, _)| index)
            .take(request.required)
            .collect();

        if chosen.len() < request.required {
            return Err(ConfigurationError::InsufficientSelection {
                permission: request.permission.to_string(),
                path: path_label(request.path),
                required: request.required,
                selected: chosen.len(),
            }
            .into());
        }
        Ok(chosen)
    }
}

/// Flattened requirements of a resolved permission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Key hashes that must sign
    pub signers: BTreeSet<KeyHash>,
    /// Script leaves on the chosen branches, satisfied by their own logic
    pub scripts: BTreeSet<ScriptHash>,
    /// The window must start at or after this time
    pub not_before: Option<Timestamp>,
    /// The window must end at or before this time
    pub not_after: Option<Timestamp>,
}

impl Resolution {
    /// Union of signers and the tightest of both time bounds
    pub fn merge(mut self, other: Resolution) -> Resolution {
        self.signers.extend(other.signers);
        self.scripts.extend(other.scripts);
        self.not_before = max_option(self.not_before, other.not_before);
        self.not_after = min_option(self.not_after, other.not_after);
        self
    }

    /// Narrow `window` so it satisfies the permission's time bounds
    pub fn constrain(
        &self,
        window: ValidityWindow,
    ) -> std::result::Result<ValidityWindow, InvariantViolation> {
        let constrained = ValidityWindow {
            valid_from: max_option(window.valid_from, self.not_before),
            valid_until: min_option(window.valid_until, self.not_after),
        };
        constrained.ensure_non_empty()?;
        Ok(constrained)
    }

    /// The flat `AllOf` of signature leaves this resolution stands for,
    /// or `None` when no key signs
    pub fn to_multisig(&self) -> Option<MultisigScript> {
        if self.signers.is_empty() {
            return None;
        }
        Some(MultisigScript::all_of(
            self.signers
                .iter()
                .map(|key_hash| MultisigScript::signature(*key_hash))
                .collect(),
        ))
    }

    fn tighten_before(&mut self, time: Timestamp) {
        self.not_after = min_option(self.not_after, Some(time));
    }

    fn tighten_after(&mut self, time: Timestamp) {
        self.not_before = max_option(self.not_before, Some(time));
    }
}

/// Resolve `script` into the signers the named permission requires
pub fn resolve_signers(
    permission: &str,
    script: &MultisigScript,
    selector: &mut dyn BranchSelector,
) -> Result<Resolution> {
    script.validate()?;

    let mut resolution = Resolution::default();
    let mut path = Vec::new();
    resolve_into(permission, script, selector, &mut path, &mut resolution)?;

    log::debug!(
        "resolved {} permission: {} signers, {} scripts",
        permission,
        resolution.signers.len(),
        resolution.scripts.len()
    );
    Ok(resolution)
}

fn resolve_into(
    permission: &str,
    script: &MultisigScript,
    selector: &mut dyn BranchSelector,
    path: &mut Vec<usize>,
    resolution: &mut Resolution,
) -> Result<()> {
    match script {
        MultisigScript::Signature { key_hash } => {
            resolution.signers.insert(*key_hash);
        }
        MultisigScript::Script { script_hash } => {
            resolution.scripts.insert(*script_hash);
        }
        MultisigScript::Before { time } => resolution.tighten_before(*time),
        MultisigScript::After { time } => resolution.tighten_after(*time),
        MultisigScript::AllOf { scripts } => {
            for (index, child) in scripts.iter().enumerate() {
                path.push(index);
                resolve_into(permission, child, selector, path, resolution)?;
                path.pop();
            }
        }
        MultisigScript::AnyOf { scripts } => {
            resolve_selected(permission, scripts, 1, selector, path, resolution)?;
        }
        MultisigScript::AtLeast { required, scripts } => {
            resolve_selected(
                permission,
                scripts,
                *required as usize,
                selector,
                path,
                resolution,
            )?;
        }
    }
    Ok(())
}

fn resolve_selected(
    permission: &str,
    scripts: &[MultisigScript],
    required: usize,
    selector: &mut dyn BranchSelector,
    path: &mut Vec<usize>,
    resolution: &mut Resolution,
) -> Result<()> {
    if required == 0 {
        return Ok(());
    }

    let chosen = selector.select(&SelectionRequest {
        permission,
        path: path.as_slice(),
        scripts,
        required,
    })?;
    check_selection(permission, path.as_slice(), scripts.len(), required, &chosen)?;

    log::debug!(
        "{} permission at {}: selected branches {:?}",
        permission,
        path_label(path),
        chosen
    );

    for index in chosen {
        path.push(index);
        resolve_into(permission, &scripts[index], selector, path, resolution)?;
        path.pop();
    }
    Ok(())
}

fn check_selection(
    permission: &str,
    path: &[usize],
    available: usize,
    required: usize,
    chosen: &[usize],
) -> std::result::Result<(), ConfigurationError> {
    let mut seen = BTreeSet::new();
    for &index in chosen {
        if index >= available {
            return Err(ConfigurationError::BranchOutOfRange {
                permission: permission.to_string(),
                path: path_label(path),
                index,
                available,
            });
        }
        if !seen.insert(index) {
            return Err(ConfigurationError::DuplicateBranch {
                permission: permission.to_string(),
                path: path_label(path),
                index,
            });
        }
    }

    if chosen.len() < required {
        return Err(ConfigurationError::InsufficientSelection {
            permission: permission.to_string(),
            path: path_label(path),
            required,
            selected: chosen.len(),
        });
    }
    Ok(())
}

fn path_label(path: &[usize]) -> String {
    if path.is_empty() {
        return "root".to_string();
    }
    path.iter()
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn max_option(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn min_option(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

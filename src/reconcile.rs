//! Set reconciler: declared manifests versus installed state.
//!
//! Pure computation.  Inputs are the parsed manifests (every manifest, not
//! only the ones in scope), the current [`Scope`], and the installed set
//! reported by the probe.  Outputs are grouped and ordered by
//! [`Declaration`]'s ordering (kind, then name, then raw line).
use std::collections::{BTreeMap, BTreeSet};

use crate::manifest::{Declaration, Kind, LoadedManifest, ManifestId, Scope};

/// Which manifests contain each declaration.
pub type Provenance = BTreeMap<Declaration, BTreeSet<ManifestId>>;

/// Build a provenance map over `manifests`.
///
/// A line repeated within one manifest or across several is one key; its
/// owner set lists every manifest that contains it.
#[must_use]
pub fn provenance<'a>(manifests: impl IntoIterator<Item = &'a LoadedManifest>) -> Provenance {
    let mut map = Provenance::new();
    for manifest in manifests {
        for decl in &manifest.declarations {
            map.entry(decl.clone())
                .or_default()
                .insert(manifest.id.clone());
        }
    }
    map
}

/// Why an installed declaration is not declared in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// Not declared in any manifest.
    SystemOnly,
    /// Declared only in manifests outside the current scope.
    CrossReferenced(BTreeSet<ManifestId>),
}

/// Result of diffing the declared set against the installed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Declarations in scope with the in-scope manifests that declare them.
    pub declared: Provenance,
    /// Declarations reported installed.
    pub installed: BTreeSet<Declaration>,
    /// Declared in scope, not installed.
    pub missing: BTreeSet<Declaration>,
    /// Installed, not declared in scope.
    pub extraneous: BTreeMap<Declaration, Ownership>,
}

/// Per-class totals for the summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Declared and installed.
    pub consistent: usize,
    /// Declared, not installed.
    pub missing: usize,
    /// Installed, not declared in scope.
    pub extraneous: usize,
    /// Extraneous and declared nowhere.
    pub system_only: usize,
    /// Extraneous but declared outside scope.
    pub cross_referenced: usize,
}

impl Reconciliation {
    /// Whether anything is missing or extraneous.
    #[must_use]
    pub fn needs_action(&self) -> bool {
        !self.missing.is_empty() || !self.extraneous.is_empty()
    }

    /// Declared and installed, in order.
    pub fn consistent(&self) -> impl Iterator<Item = &Declaration> {
        self.declared
            .keys()
            .filter(|d| self.installed.contains(*d))
    }

    /// Extraneous declarations that are also declared outside scope.
    pub fn cross_referenced(&self) -> impl Iterator<Item = &Declaration> {
        self.extraneous
            .iter()
            .filter(|(_, o)| matches!(o, Ownership::CrossReferenced(_)))
            .map(|(d, _)| d)
    }

    /// Per-class totals.
    #[must_use]
    pub fn counts(&self) -> Counts {
        let cross_referenced = self.cross_referenced().count();
        Counts {
            consistent: self.consistent().count(),
            missing: self.missing.len(),
            extraneous: self.extraneous.len(),
            system_only: self.extraneous.len() - cross_referenced,
            cross_referenced,
        }
    }
}

/// Diff the in-scope manifests against `installed`.
///
/// Extraneous lines are looked up in every manifest outside `scope`; a hit
/// makes them cross-referenced (with every owner), otherwise system-only.
#[must_use]
pub fn reconcile(
    manifests: &[LoadedManifest],
    scope: &Scope,
    installed: BTreeSet<Declaration>,
) -> Reconciliation {
    let (in_scope, out_of_scope): (Vec<&LoadedManifest>, Vec<&LoadedManifest>) =
        manifests.iter().partition(|m| scope.contains(&m.id));
    let declared = provenance(in_scope);
    let elsewhere = provenance(out_of_scope);

    let missing = declared
        .keys()
        .filter(|d| !installed.contains(*d))
        .cloned()
        .collect();

    let extraneous = installed
        .iter()
        .filter(|d| !declared.contains_key(*d))
        .map(|d| {
            let ownership = elsewhere
                .get(d)
                .map_or(Ownership::SystemOnly, |owners| {
                    Ownership::CrossReferenced(owners.clone())
                });
            (d.clone(), ownership)
        })
        .collect();

    Reconciliation {
        declared,
        installed,
        missing,
        extraneous,
    }
}

/// Partition declarations by kind, each group sorted by name then raw line.
/// Kinds with no entries are omitted.
#[must_use]
pub fn group_by_kind<'a>(
    items: impl IntoIterator<Item = &'a Declaration>,
) -> BTreeMap<Kind, Vec<&'a Declaration>> {
    let mut groups: BTreeMap<Kind, Vec<&Declaration>> = BTreeMap::new();
    for decl in items {
        groups.entry(decl.kind).or_default().push(decl);
    }
    for group in groups.values_mut() {
        group.sort();
    }
    groups
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::manifest::{Catalog, Selection};
    use std::fs;

    fn decl(line: &str) -> Declaration {
        Declaration::parse(line).unwrap()
    }

    fn loaded(id: ManifestId, lines: &[&str]) -> LoadedManifest {
        LoadedManifest {
            path: id.file_name().into(),
            id,
            declarations: lines.iter().map(|l| decl(l)).collect(),
        }
    }

    fn aux(name: &str) -> ManifestId {
        ManifestId::Auxiliary(name.to_string())
    }

    /// Scope over a temp root containing the given auxiliary files.
    fn scope_for(auxiliaries: &[&str], include: &[&str]) -> (tempfile::TempDir, Scope) {
        let dir = tempfile::tempdir().unwrap();
        for name in auxiliaries {
            fs::write(dir.path().join(format!("Brewfile.{name}")), "").unwrap();
        }
        let scope = Catalog::discover(dir.path()).unwrap().scope(&Selection {
            include: include.iter().map(ToString::to_string).collect(),
            all: false,
        });
        (dir, scope)
    }

    fn installed(lines: &[&str]) -> BTreeSet<Declaration> {
        lines.iter().map(|l| decl(l)).collect()
    }

    #[test]
    fn single_manifest_with_system_only_extra() {
        let manifests = [loaded(ManifestId::Primary, &[r#"brew "jq""#])];
        let (_dir, scope) = scope_for(&[], &[]);
        let result = reconcile(
            &manifests,
            &scope,
            installed(&[r#"brew "jq""#, r#"brew "wget""#]),
        );
        assert!(result.missing.is_empty());
        assert_eq!(result.extraneous.len(), 1);
        assert_eq!(
            result.extraneous.get(&decl(r#"brew "wget""#)),
            Some(&Ownership::SystemOnly)
        );
    }

    #[test]
    fn missing_and_extraneous_are_disjoint() {
        let manifests = [loaded(
            ManifestId::Primary,
            &[r#"brew "a""#, r#"brew "b""#, r#"cask "c""#],
        )];
        let (_dir, scope) = scope_for(&[], &[]);
        let result = reconcile(
            &manifests,
            &scope,
            installed(&[r#"brew "b""#, r#"cask "c""#, r#"brew "d""#]),
        );
        assert!(
            result
                .missing
                .iter()
                .all(|d| !result.extraneous.contains_key(d))
        );
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.extraneous.len(), 1);
        assert_eq!(result.consistent().count(), 2);
    }

    #[test]
    fn out_of_scope_line_is_cross_referenced_with_all_owners() {
        let manifests = [
            loaded(ManifestId::Primary, &[r#"brew "jq""#]),
            loaded(aux("home"), &[r#"cask "steam""#]),
            loaded(aux("work"), &[r#"cask "steam""#, r#"brew "awscli""#]),
        ];
        let (_dir, scope) = scope_for(&["home", "work"], &[]);
        let result = reconcile(
            &manifests,
            &scope,
            installed(&[r#"brew "jq""#, r#"cask "steam""#, r#"brew "htop""#]),
        );
        assert_eq!(
            result.extraneous.get(&decl(r#"cask "steam""#)),
            Some(&Ownership::CrossReferenced(BTreeSet::from([
                aux("home"),
                aux("work")
            ])))
        );
        assert_eq!(
            result.extraneous.get(&decl(r#"brew "htop""#)),
            Some(&Ownership::SystemOnly)
        );
        let counts = result.counts();
        assert_eq!(counts.cross_referenced, 1);
        assert_eq!(counts.system_only, 1);
        // Out-of-scope lines are not required.
        assert!(!result.missing.contains(&decl(r#"brew "awscli""#)));
    }

    #[test]
    fn in_scope_auxiliary_counts_as_declared() {
        let manifests = [
            loaded(ManifestId::Primary, &[]),
            loaded(aux("work"), &[r#"brew "awscli""#]),
        ];
        let (_dir, scope) = scope_for(&["work"], &["work"]);
        let result = reconcile(&manifests, &scope, installed(&[r#"brew "awscli""#]));
        assert!(!result.needs_action());
        assert_eq!(result.counts().consistent, 1);
    }

    #[test]
    fn duplicate_line_counts_once_with_two_owners() {
        let manifests = [
            loaded(ManifestId::Primary, &[r#"brew "git""#]),
            loaded(aux("work"), &[r#"brew "git""#]),
        ];
        let (_dir, scope) = scope_for(&["work"], &["work"]);
        let result = reconcile(&manifests, &scope, BTreeSet::new());
        assert_eq!(result.missing.len(), 1);
        assert_eq!(
            result.declared.get(&decl(r#"brew "git""#)),
            Some(&BTreeSet::from([ManifestId::Primary, aux("work")]))
        );
    }

    #[test]
    fn whitespace_variant_is_a_different_line() {
        let manifests = [loaded(ManifestId::Primary, &["brew  \"jq\""])];
        let (_dir, scope) = scope_for(&[], &[]);
        let result = reconcile(&manifests, &scope, installed(&[r#"brew "jq""#]));
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.extraneous.len(), 1);
    }

    #[test]
    fn grouping_orders_by_kind_then_name() {
        let decls = [
            decl(r#"cask "zed""#),
            decl(r#"brew "wget""#),
            decl(r#"brew "Jq""#),
            decl(r#"tap "a/b""#),
            decl(r#"brew "jq""#),
        ];
        let groups = group_by_kind(&decls);
        let kinds: Vec<Kind> = groups.keys().copied().collect();
        assert_eq!(kinds, [Kind::Tap, Kind::Brew, Kind::Cask]);
        let brews: Vec<&str> = groups[&Kind::Brew].iter().map(|d| d.name.as_str()).collect();
        assert_eq!(brews, ["Jq", "jq", "wget"]);
    }

    #[test]
    fn grouping_breaks_name_ties_by_raw_line() {
        let decls = [
            decl(r#"mas "Xcode", id: 2"#),
            decl(r#"mas "Xcode", id: 1"#),
        ];
        let groups = group_by_kind(&decls);
        assert_eq!(groups[&Kind::Mas][0].raw_line, r#"mas "Xcode", id: 1"#);
    }
}

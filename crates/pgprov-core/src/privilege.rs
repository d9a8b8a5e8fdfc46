//! Privilege tokens, privilege sets and the desired-privileges descriptor.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{ObjectType, PrivilegeError, expansion};

/// Token of the alias that stands for every privilege of an object type.
pub const ALL_PRIVILEGES: &str = "ALL";

/// A single grantable permission (`SELECT`, `CONNECT`, ...).
///
/// Tokens are compared verbatim, so `select` and `SELECT` are different
/// privileges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Privilege(String);

impl Privilege {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the `ALL` alias token.
    pub fn is_all(&self) -> bool {
        self.0 == ALL_PRIVILEGES
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Privilege {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Privilege {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unordered collection of privileges with duplicates collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivilegeSet(BTreeSet<Privilege>);

impl PrivilegeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|p| p.as_str() == token)
    }

    pub fn insert(&mut self, privilege: impl Into<Privilege>) -> bool {
        self.0.insert(privilege.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Privilege> {
        self.0.iter()
    }

    /// Privileges present in `self` but not in `other`.
    pub fn difference(&self, other: &PrivilegeSet) -> PrivilegeSet {
        self.0.difference(&other.0).cloned().collect()
    }

    /// Sorted tokens joined by `sep`.
    pub fn join(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(Privilege::as_str)
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl<P: Into<Privilege>> FromIterator<P> for PrivilegeSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Extend<Privilege> for PrivilegeSet {
    fn extend<I: IntoIterator<Item = Privilege>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a PrivilegeSet {
    type Item = &'a Privilege;
    type IntoIter = std::collections::btree_set::Iter<'a, Privilege>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PrivilegeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.join(", "))
    }
}

/// What the user asked for: the `ALL` alias or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredPrivileges {
    All,
    Explicit(PrivilegeSet),
}

impl DesiredPrivileges {
    /// Build from declared tokens.
    ///
    /// A lone `ALL` becomes [`DesiredPrivileges::All`]. `ALL` mixed with other
    /// tokens and empty lists are rejected.
    pub fn parse<I, S>(tokens: I) -> Result<Self, PrivilegeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: PrivilegeSet = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();

        if set.is_empty() {
            return Err(PrivilegeError::EmptyPrivileges);
        }
        if set.iter().any(Privilege::is_all) {
            if set.len() > 1 {
                return Err(PrivilegeError::MixedAll(set.join(", ")));
            }
            return Ok(DesiredPrivileges::All);
        }
        Ok(DesiredPrivileges::Explicit(set))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, DesiredPrivileges::All)
    }

    /// Concrete privileges this descriptor stands for on `object_type` at `version`.
    pub fn effective(&self, object_type: ObjectType, version: &Version) -> PrivilegeSet {
        match self {
            DesiredPrivileges::All => expansion::expand_all(object_type, version),
            DesiredPrivileges::Explicit(set) => set.clone(),
        }
    }

    /// Check that every explicit privilege can be granted on `object_type`.
    pub fn validate(&self, object_type: ObjectType, version: &Version) -> Result<(), PrivilegeError> {
        let DesiredPrivileges::Explicit(set) = self else {
            return Ok(());
        };
        let allowed = expansion::expand_all(object_type, version);
        match set.difference(&allowed).iter().next() {
            Some(p) => Err(PrivilegeError::NotAllowed {
                privilege: p.to_string(),
                object_type,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for DesiredPrivileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredPrivileges::All => f.write_str(ALL_PRIVILEGES),
            DesiredPrivileges::Explicit(set) => set.fmt(f),
        }
    }
}

/// What a role holds on one object, and which of it the role may grant on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedPrivileges {
    pub privileges: PrivilegeSet,
    /// Privileges held `WITH GRANT OPTION`. Always a subset of `privileges`.
    #[serde(default, skip_serializing_if = "PrivilegeSet::is_empty")]
    pub grantable: PrivilegeSet,
}

impl GrantedPrivileges {
    pub fn new(privileges: PrivilegeSet, grantable: PrivilegeSet) -> Self {
        Self {
            privileges,
            grantable,
        }
    }

    /// Whether the grant option matches: every held privilege grantable when
    /// `with_grant_option`, none of them otherwise.
    pub fn grant_option_matches(&self, with_grant_option: bool) -> bool {
        if with_grant_option {
            self.grantable == self.privileges
        } else {
            self.grantable.is_empty()
        }
    }
}

impl From<PrivilegeSet> for GrantedPrivileges {
    fn from(privileges: PrivilegeSet) -> Self {
        Self::new(privileges, PrivilegeSet::new())
    }
}

impl fmt::Display for GrantedPrivileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.privileges.fmt(f)?;
        if !self.grantable.is_empty() {
            write!(f, " grantable {}", self.grantable)?;
        }
        Ok(())
    }
}

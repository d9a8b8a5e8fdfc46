//! Granted-versus-desired privilege comparison.

use semver::Version;

use crate::{DesiredPrivileges, ObjectType, PrivilegeSet};

/// Decide whether `granted` is exactly what `desired` asks for.
///
/// `ALL` is resolved through the expansion table for `object_type` at
/// `version` first. The comparison is set equality: a missing privilege and an
/// extra one are both drift.
pub fn privileges_equal(
    granted: &PrivilegeSet,
    desired: &DesiredPrivileges,
    object_type: ObjectType,
    version: &Version,
) -> bool {
    let effective = desired.effective(object_type, version);

    if desired.is_all() {
        tracing::debug!(
            object_type = %object_type,
            version = %version,
            expanded = %effective,
            "expanded ALL privileges"
        );
    }

    *granted == effective
}

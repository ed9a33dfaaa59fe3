//! Offline ACL inspection.

use anyhow::{Context, Result};
use tenantgate_acl::{authorize, hash, Acl};
use tenantgate_types::{AccessCandidate, AccessLevel, Role};

/// Print every grant in a serialized ACL.
pub fn decode_acl(serialized: &str, json: bool) -> Result<()> {
    let acl = Acl::from_serialized(serialized).context("Failed to parse ACL")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&acl.to_data())?);
        return Ok(());
    }

    println!("hash: {}", acl.hash_algorithm());
    println!("migrated: {}", acl.is_migrated());
    if acl.is_empty() {
        println!("(no grants)");
    }
    for (role, owners) in acl.entries() {
        for (owner, levels) in owners {
            let levels: Vec<&str> = levels.iter().map(AccessLevel::as_str).collect();
            let owner = if owner.is_empty() { "-" } else { owner.as_str() };
            println!("{:<7}{:<20} {}", role.as_str(), owner, levels.join(","));
        }
    }
    Ok(())
}

pub fn hash_owner(id: &str, algorithm: &str) -> Result<()> {
    let digest = hash::hash(algorithm, id)
        .with_context(|| format!("Known algorithms: {}", hash::registered_names().join(", ")))?;
    println!("{}", digest);
    Ok(())
}

/// Dry-run an access check. A denial is returned as an error so the process
/// exits non-zero.
pub fn check_access(serialized: &str, role: Role, id: &str, levels: &[AccessLevel]) -> Result<()> {
    let acl = Acl::from_serialized(serialized).context("Failed to parse ACL")?;
    let candidate = AccessCandidate::new(role, id);
    let mut request = candidate.request();
    for level in levels {
        request = request.add_level("cli", *level);
    }

    authorize(&request, acl)?;
    println!("Access Granted");
    Ok(())
}

//! Compact string form of an [`Acl`]
//!
//! ```text
//! h:<algorithm>[|m:1]|<role>:<owner>/<levels>,<owner>/<levels>|<role>:...
//! ```
//!
//! Roles and levels use the single-character codes in [`ROLE_CODES`] and
//! [`LEVEL_CODES`]. Owner ids containing a separator or `%` are written as
//! `%XX` escapes.

use crate::acl::{Acl, AclEntries, DEFAULT_HASH_ALGORITHM};
use crate::error::{AclError, Result};
use tenantgate_types::{AccessLevel, Role};

pub const SEGMENT_SEPARATOR: char = '|';
pub const TAG_SEPARATOR: char = ':';
pub const ENTRY_SEPARATOR: char = ',';
pub const LEVEL_SEPARATOR: char = '/';

const HASH_TAG: &str = "h";
const MIGRATED_TAG: &str = "m";
pub(crate) const RESERVED: &[char] = &[
    '%',
    SEGMENT_SEPARATOR,
    TAG_SEPARATOR,
    ENTRY_SEPARATOR,
    LEVEL_SEPARATOR,
];

pub const ROLE_CODES: [(Role, char); 4] = [
    (Role::Public, 'p'),
    (Role::User, 'u'),
    (Role::Agent, 'a'),
    (Role::Team, 't'),
];

pub const LEVEL_CODES: [(AccessLevel, char); 3] = [
    (AccessLevel::Read, 'r'),
    (AccessLevel::Write, 'w'),
    (AccessLevel::Owner, 'o'),
];

pub fn role_code(role: Role) -> char {
    ROLE_CODES
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, c)| *c)
        .unwrap_or('?')
}

pub fn role_from_code(code: &str) -> Option<Role> {
    let mut chars = code.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    ROLE_CODES.iter().find(|(_, rc)| *rc == c).map(|(r, _)| *r)
}

pub fn level_code(level: AccessLevel) -> char {
    LEVEL_CODES
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, c)| *c)
        .unwrap_or('?')
}

pub fn level_from_code(code: char) -> Option<AccessLevel> {
    LEVEL_CODES.iter().find(|(_, lc)| *lc == code).map(|(l, _)| *l)
}

pub fn encode(acl: &Acl) -> String {
    let mut segments = vec![format!(
        "{}{}{}",
        HASH_TAG,
        TAG_SEPARATOR,
        acl.hash_algorithm()
    )];
    if acl.is_migrated() {
        segments.push(format!("{}{}1", MIGRATED_TAG, TAG_SEPARATOR));
    }

    for (role, owners) in acl.entries() {
        let entries: Vec<String> = owners
            .iter()
            .map(|(owner, levels)| {
                let codes: String = levels.iter().map(|l| level_code(*l)).collect();
                format!("{}{}{}", escape(owner), LEVEL_SEPARATOR, codes)
            })
            .collect();
        segments.push(format!(
            "{}{}{}",
            role_code(*role),
            TAG_SEPARATOR,
            entries.join(&ENTRY_SEPARATOR.to_string())
        ));
    }

    segments.join(&SEGMENT_SEPARATOR.to_string())
}

pub fn decode(input: &str) -> Result<Acl> {
    if input.is_empty() {
        return Ok(Acl::new());
    }

    let mut hash_algorithm = DEFAULT_HASH_ALGORITHM.to_string();
    let mut migrated = false;
    let mut entries = AclEntries::new();

    for (index, segment) in input.split(SEGMENT_SEPARATOR).enumerate() {
        if segment.is_empty() {
            return Err(AclError::malformed(segment, "empty segment"));
        }
        let (tag, body) = segment
            .split_once(TAG_SEPARATOR)
            .ok_or_else(|| AclError::malformed(segment, "missing ':' after tag"))?;

        match tag {
            HASH_TAG => {
                if index != 0 {
                    return Err(AclError::malformed(segment, "hash segment must come first"));
                }
                if body.is_empty() {
                    return Err(AclError::malformed(segment, "empty hash algorithm"));
                }
                hash_algorithm = body.to_string();
            }
            MIGRATED_TAG => {
                if !entries.is_empty() {
                    return Err(AclError::malformed(segment, "migration marker after role entries"));
                }
                migrated = match body {
                    "1" => true,
                    "0" => false,
                    _ => {
                        return Err(AclError::malformed(
                            segment,
                            "migration marker must be 0 or 1",
                        ))
                    }
                };
            }
            code => {
                let role = role_from_code(code).ok_or_else(|| {
                    AclError::malformed(segment, format!("unknown role code '{}'", code))
                })?;
                if entries.contains_key(&role) {
                    return Err(AclError::malformed(segment, "duplicate role segment"));
                }
                let owners = entries.entry(role).or_default();
                if body.is_empty() {
                    continue;
                }
                for entry in body.split(ENTRY_SEPARATOR) {
                    let (owner, codes) = entry.split_once(LEVEL_SEPARATOR).ok_or_else(|| {
                        AclError::malformed(segment, format!("entry '{}' has no '/'", entry))
                    })?;
                    let owner = unescape(owner).ok_or_else(|| {
                        AclError::malformed(segment, format!("bad escape in owner '{}'", owner))
                    })?;
                    let granted = owners.entry(owner).or_default();
                    for c in codes.chars() {
                        let level = level_from_code(c).ok_or_else(|| {
                            AclError::malformed(segment, format!("unknown level code '{}'", c))
                        })?;
                        if !granted.contains(&level) {
                            granted.push(level);
                        }
                    }
                }
            }
        }
    }

    Acl::from_parts(&hash_algorithm, entries, migrated)
}

fn escape(owner: &str) -> String {
    if !owner.contains(RESERVED) {
        return owner.to_string();
    }
    let mut out = String::with_capacity(owner.len() + 4);
    for c in owner.chars() {
        if RESERVED.contains(&c) {
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

fn unescape(owner: &str) -> Option<String> {
    if !owner.contains('%') {
        return Some(owner.to_string());
    }
    let mut out = String::with_capacity(owner.len());
    let mut chars = owner.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let hi = chars.next()?.to_digit(16)?;
        let lo = chars.next()?.to_digit(16)?;
        let decoded = char::from_u32(hi * 16 + lo)?;
        if !RESERVED.contains(&decoded) {
            return None;
        }
        out.push(decoded);
    }
    Some(out)
}

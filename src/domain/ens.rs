//! ENS name handling: label normalization and EIP-137 namehash.

use alloy_primitives::{B256, keccak256};

use super::error::ValidationError;

/// Longest label accepted (DNS limit)
pub const MAX_LABEL_LEN: usize = 63;

/// Shortest second-level `.eth` label the registrar will sell
pub const MIN_ETH_LABEL_LEN: usize = 3;

/// Normalize a single label: trimmed, lower-case, `[a-z0-9-]`, no edge hyphens.
pub fn normalize_label(label: &str) -> Result<String, ValidationError> {
    let label = label.trim().to_lowercase();

    if label.is_empty() {
        return Err(ValidationError::field("label", "ENS label is empty"));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(ValidationError::field(
            "label",
            format!("ENS label is longer than {} characters", MAX_LABEL_LEN),
        ));
    }
    if let Some(c) = label
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(ValidationError::field(
            "label",
            format!("ENS label contains invalid character '{}'", c),
        ));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(ValidationError::field(
            "label",
            "ENS label must not start or end with a hyphen",
        ));
    }

    Ok(label)
}

/// Normalize a dotted name label by label.
pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let labels = name
        .trim()
        .trim_end_matches('.')
        .split('.')
        .map(normalize_label)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels.join("."))
}

/// Normalize a company domain; it must sit under `tld` with at least two labels.
pub fn normalize_domain(name: &str, tld: &str) -> Result<String, ValidationError> {
    let name = normalize_name(name)?;
    let suffix = format!(".{}", tld);
    if !name.ends_with(&suffix) {
        return Err(ValidationError::field(
            "ens_domain",
            format!("ENS domain must end with {}", suffix),
        ));
    }
    Ok(name)
}

/// Split `name.tld` (or a bare `name`) into the label the registrar checks.
pub fn registrable_label(name: &str, tld: &str) -> Result<String, ValidationError> {
    let name = normalize_name(name)?;
    let label = match name.strip_suffix(&format!(".{}", tld)) {
        Some(rest) => rest.to_string(),
        None => name,
    };
    if label.contains('.') {
        return Err(ValidationError::field(
            "name",
            format!("only second-level .{} names can be checked", tld),
        ));
    }
    if label.len() < MIN_ETH_LABEL_LEN {
        return Err(ValidationError::field(
            "name",
            format!(".{} names need at least {} characters", tld, MIN_ETH_LABEL_LEN),
        ));
    }
    Ok(label)
}

#[must_use]
pub fn labelhash(label: &str) -> B256 {
    keccak256(label.as_bytes())
}

/// EIP-137 namehash. The empty name hashes to the zero node.
#[must_use]
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(labelhash(label).as_slice());
        node = keccak256(buf);
    }
    node
}

/// `0x`-prefixed lower-case hex of a node
#[must_use]
pub fn node_hex(node: &B256) -> String {
    format!("0x{}", hex::encode(node.as_slice()))
}

#[must_use]
pub fn subdomain(label: &str, parent: &str) -> String {
    format!("{}.{}", label, parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(
            node_hex(&namehash("")),
            "0x0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(
            node_hex(&namehash("eth")),
            "0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            node_hex(&namehash("foo.eth")),
            "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Alice ").unwrap(), "alice");
        assert_eq!(normalize_label("bob-2").unwrap(), "bob-2");
        assert!(normalize_label("").is_err());
        assert!(normalize_label("-alice").is_err());
        assert!(normalize_label("alice-").is_err());
        assert!(normalize_label("al ice").is_err());
        assert!(normalize_label("al_ice").is_err());
        assert!(normalize_label(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("Acme.ETH", "eth").unwrap(), "acme.eth");
        assert_eq!(normalize_domain("acme.eth.", "eth").unwrap(), "acme.eth");
        assert!(normalize_domain("acme.com", "eth").is_err());
        assert!(normalize_domain("acme..eth", "eth").is_err());
        assert!(normalize_domain("eth", "eth").is_err());
    }

    #[test]
    fn test_registrable_label() {
        assert_eq!(registrable_label("Vitalik.eth", "eth").unwrap(), "vitalik");
        assert_eq!(registrable_label("acme", "eth").unwrap(), "acme");
        assert!(registrable_label("ab.eth", "eth").is_err());
        assert!(registrable_label("pay.acme.eth", "eth").is_err());
    }

    #[test]
    fn test_subdomain() {
        assert_eq!(subdomain("alice", "acme.eth"), "alice.acme.eth");
    }
}

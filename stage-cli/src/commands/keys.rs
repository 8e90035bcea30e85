//! Generate key material.

use anyhow::{Context, Result};
use stage_core::{generate_key_pair, SharedKey};
use std::io::Write;

/// Print a new base64 shared key.
pub fn shared_key(out: &mut impl Write) -> Result<()> {
    let key = SharedKey::generate().context("Failed to generate shared key")?;
    writeln!(out, "shared_key = \"{}\"", key)?;
    Ok(())
}

/// Print a new base64 signing key pair.
///
/// The public key goes in the relay config, the private key in each client's.
pub fn keypair(out: &mut impl Write) -> Result<()> {
    let (public, private) = generate_key_pair();
    writeln!(out, "sign_public_key = \"{}\"", public)?;
    writeln!(out, "sign_private_key = \"{}\"", private)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::{PrivateKey, PublicKey};

    fn value<'a>(line: &'a str, name: &str) -> &'a str {
        line.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix(" = \""))
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap()
    }

    #[test]
    fn shared_key_output_parses() {
        let mut out = Vec::new();
        shared_key(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let key: SharedKey = value(text.trim(), "shared_key").parse().unwrap();
        assert_eq!(key.as_bytes().len(), 32);
    }

    #[test]
    fn keypair_output_is_a_matching_pair() {
        let mut out = Vec::new();
        keypair(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let public: PublicKey = value(lines.next().unwrap(), "sign_public_key")
            .parse()
            .unwrap();
        let private: PrivateKey = value(lines.next().unwrap(), "sign_private_key")
            .parse()
            .unwrap();
        assert_eq!(private.public_key(), public);
    }
}

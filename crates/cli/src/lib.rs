use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};

/// Parse an address or size argument. Accepts plain decimal and `0x`-prefixed
/// hexadecimal, the way addresses are usually pasted out of a disassembler.
pub fn parse_u64(value: &str) -> Result<u64> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).with_context(|| format!("Invalid hex value: {value}"))
    } else {
        value.parse::<u64>().map_err(|_| anyhow!("Invalid numeric value: {value}"))
    }
}

/// Infer a display name for a binary from its path.
pub fn infer_binary_name(path: &Path) -> String {
    path.file_name()
        .and_then(|os_str| os_str.to_str())
        .unwrap_or("unnamed-binary")
        .to_string()
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open binary for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read binary for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_u64_accepts_hex_and_decimal() {
        assert_eq!(parse_u64("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_u64("0X20").unwrap(), 0x20);
        assert_eq!(parse_u64("4096").unwrap(), 4096);
        assert!(parse_u64("0xzz").is_err());
        assert!(parse_u64("not-a-number").is_err());
    }

    #[test]
    fn infer_binary_name_uses_file_name() {
        assert_eq!(infer_binary_name(Path::new("/tmp/libgame.so")), "libgame.so");
    }
}

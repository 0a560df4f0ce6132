use anyhow::{Context, Result};
use common::Case;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Check that the service stored the dump of `case` intact under `data_dir`
pub fn validate_stored_dump(data_dir: &Path, case: &Case, expected_content: &[u8]) -> Result<()> {
    let case_dir = data_dir.join(&case.id);
    if !case_dir.is_dir() {
        anyhow::bail!("Case directory does not exist: {:?}", case_dir);
    }
    println!("  ✓ Case directory exists: {:?}", case_dir);

    let extension = case
        .original_filename()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .context("Case metadata has no original filename")?;
    let dump_path = case_dir.join(format!("raw.{}", extension));

    let stored = fs::read(&dump_path)
        .with_context(|| format!("Failed to read stored dump {:?}", dump_path))?;
    if stored != expected_content {
        anyhow::bail!("Stored dump {:?} differs from the uploaded file", dump_path);
    }
    println!("  ✓ Stored dump matches upload ({} bytes)", stored.len());

    let file = case.files.first().context("Case lists no stored file")?;
    let checksum = hex::encode(Sha256::digest(&stored));
    if file.checksum != checksum {
        anyhow::bail!(
            "Checksum mismatch: case reports {}, stored dump hashes to {}",
            file.checksum,
            checksum
        );
    }
    if file.file_size != stored.len() as u64 {
        anyhow::bail!(
            "Size mismatch: case reports {}, stored dump is {} bytes",
            file.file_size,
            stored.len()
        );
    }
    println!("  ✓ Checksum and size recorded correctly");

    Ok(())
}

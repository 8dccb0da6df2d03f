use sha2::{Digest, Sha256};
use std::path::Path;

pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Hashes a file on disk without loading it all at once
pub async fn calculate_file_hash(path: &Path) -> std::io::Result<String> {
    let file = tokio::fs::File::open(path).await?;
    calculate_hash_from_reader(file).await
}

pub async fn calculate_hash_from_reader<R: tokio::io::AsyncRead + Unpin>(
    mut reader: R,
) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = tokio::io::AsyncReadExt::read(&mut reader, &mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_hash() {
        let hash = calculate_hash(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_reader_matches_slice() {
        let data = vec![0x5Au8; 20_000];
        let from_reader = calculate_hash_from_reader(&data[..]).await.unwrap();
        assert_eq!(from_reader, calculate_hash(&data));
    }

    #[tokio::test]
    async fn test_calculate_file_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            calculate_file_hash(&path).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

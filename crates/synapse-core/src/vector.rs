//! Embedding vector codec for BLOB storage.
//!
//! Embeddings are persisted in SQLite as BLOBs of little-endian `f32`
//! bytes. The codec is its own module so the store implementations and
//! tests share one definition of the format.

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// Each `f32` is stored as 4 bytes in little-endian order, producing
/// a BLOB of `vec.len() × 4` bytes.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
///
/// Reverses [`vec_to_blob`]: reads 4-byte little-endian `f32` values
/// from the byte slice. A trailing partial chunk is ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        assert_eq!(blob.len(), 20);
        assert_eq!(blob_to_vec(&blob), vec);
    }

    #[test]
    fn test_empty() {
        assert!(vec_to_blob(&[]).is_empty());
        assert!(blob_to_vec(&[]).is_empty());
    }

    #[test]
    fn test_partial_chunk_ignored() {
        let mut blob = vec_to_blob(&[1.5f32]);
        blob.push(0xFF);
        assert_eq!(blob_to_vec(&blob), vec![1.5f32]);
    }
}

/// 推广 hash 长度
pub const CAMPAIGN_HASH_LENGTH: usize = 10;

/// 推广 hash 字符集（62 个字母数字）
pub const CAMPAIGN_HASH_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789abcdefghijklmnopqrstuvwxyz";

/// 生成推广 hash
///
/// 已发放的 hash 依赖固定的长度和字符集，不能修改。
pub fn generate_campaign_hash() -> String {
    let mut buf = [0u8; CAMPAIGN_HASH_LENGTH];
    for slot in buf.iter_mut() {
        *slot = CAMPAIGN_HASH_ALPHABET[rand::random_range(0..CAMPAIGN_HASH_ALPHABET.len())];
    }
    buf.iter().map(|&b| b as char).collect()
}

/// 检查 hash 是否符合推广 hash 格式
pub fn is_valid_campaign_hash(hash: &str) -> bool {
    hash.len() == CAMPAIGN_HASH_LENGTH && hash.bytes().all(|b| CAMPAIGN_HASH_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_hash_format() {
        for _ in 0..100 {
            let hash = generate_campaign_hash();
            assert_eq!(hash.len(), CAMPAIGN_HASH_LENGTH);
            assert!(is_valid_campaign_hash(&hash), "{hash}");
        }
    }

    #[test]
    fn test_hashes_differ() {
        assert_ne!(generate_campaign_hash(), generate_campaign_hash());
    }

    #[test]
    fn test_is_valid_campaign_hash() {
        assert!(is_valid_campaign_hash("Ab3dE9xYz0"));
        assert!(!is_valid_campaign_hash("Ab3dE9xYz"));
        assert!(!is_valid_campaign_hash("Ab3dE9xYz-"));
    }
}

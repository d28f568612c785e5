use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// 肖像数据
///
/// 保存解码后的原始图像字节。文档中以 `mugshot` 叶子节点存放
/// `base64(zlib(原始字节))`。肖像是唯一允许两次保存之间字节不同的
/// 字段：重新压缩同一图像可以产生不同的字节序列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitBlob {
    /// 原始图像字节
    pub data: Vec<u8>,
}

impl PortraitBlob {
    /// 从原始图像字节创建
    pub fn new(data: Vec<u8>) -> Self {
        PortraitBlob { data }
    }

    /// 编码为文档文本形式
    pub fn encode(&self) -> Result<String, std::io::Error> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.data)?;
        let compressed = encoder.finish()?;
        Ok(BASE64.encode(compressed))
    }

    /// 从文档文本形式解码
    ///
    /// # 返回
    /// 失败时返回原因描述；调用方（加载器）把失败降级为警告，
    /// 而不是让整个加载失败。
    pub fn decode(encoded: &str) -> Result<Self, String> {
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

        let compressed = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| format!("Base64解码失败: {}", e))?;

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .map_err(|e| format!("zlib解压失败: {}", e))?;

        Ok(PortraitBlob { data })
    }

    /// 图像字节数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let original = PortraitBlob::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4, 5]);
        let encoded = original.encode().unwrap();
        let decoded = PortraitBlob::decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_tolerates_whitespace() {
        let original = PortraitBlob::new(b"mugshot bytes".to_vec());
        let encoded = original.encode().unwrap();

        // 模拟写入器折行后的文档形态
        let wrapped = encoded
            .as_bytes()
            .chunks(8)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\n    ");
        let decoded = PortraitBlob::decode(&wrapped).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(PortraitBlob::decode("!!!not base64!!!").is_err());

        // 合法 base64 但不是 zlib 流
        let bogus = BASE64.encode(b"plain bytes, not compressed");
        assert!(PortraitBlob::decode(&bogus).is_err());
    }

    #[test]
    fn test_empty_portrait() {
        let empty = PortraitBlob::new(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);

        let decoded = PortraitBlob::decode(&empty.encode().unwrap()).unwrap();
        assert!(decoded.is_empty());
    }
}

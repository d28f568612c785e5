use encoding_rs;

// 支持的编码
const SUPPORTED_ENCODINGS: &[&str] = &["utf-8", "windows-1252", "windows-1250", "windows-1251"];

#[derive(Debug, Clone)]
pub struct RawText {
    pub content: String,
    pub encoding: String,
}

impl RawText {
    /// 尝试多种编码解码
    pub fn decode(data: &[u8]) -> Self {
        for encoding_name in SUPPORTED_ENCODINGS {
            if let Some(encoding) = encoding_rs::Encoding::for_label(encoding_name.as_bytes()) {
                let (decoded, _, had_errors) = encoding.decode(data);
                if !had_errors {
                    return RawText {
                        content: decoded.into_owned(),
                        encoding: encoding_name.to_string(),
                    };
                }
            }
        }

        // 回退到UTF-8，忽略错误
        RawText {
            content: String::from_utf8_lossy(data).into_owned(),
            encoding: "utf-8".to_string(),
        }
    }
}

/// 转义文本内容中的预定义实体
///
/// 写入器对元素文本和属性值统一转义，保证输出始终可重新解析。
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// 还原预定义实体
///
/// 仅支持五个预定义实体与十进制/十六进制字符引用，
/// 未知实体视为解析错误，由调用方报告位置。
pub fn unescape_text(text: &str) -> Result<String, String> {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.char_indices();

    while let Some((start, c)) = chars.next() {
        if c != '&' {
            result.push(c);
            continue;
        }

        // 查找实体终结符
        let rest = &text[start + 1..];
        let end = match rest.find(';') {
            Some(pos) => pos,
            None => return Err("未终结的实体引用".to_string()),
        };
        let entity = &rest[..end];

        match entity {
            "amp" => result.push('&'),
            "lt" => result.push('<'),
            "gt" => result.push('>'),
            "quot" => result.push('"'),
            "apos" => result.push('\''),
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                let code = u32::from_str_radix(&entity[2..], 16)
                    .map_err(|_| format!("无效的字符引用: &{};", entity))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| format!("字符引用超出范围: &{};", entity))?;
                result.push(decoded);
            }
            _ if entity.starts_with('#') => {
                let code = entity[1..].parse::<u32>()
                    .map_err(|_| format!("无效的字符引用: &{};", entity))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| format!("字符引用超出范围: &{};", entity))?;
                result.push(decoded);
            }
            _ => return Err(format!("未知实体: &{};", entity)),
        }

        // 跳过实体主体与分号
        for _ in 0..end + 1 {
            chars.next();
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let decoded = RawText::decode("狗剃刀".as_bytes());
        assert_eq!(decoded.content, "狗剃刀");
        assert_eq!(decoded.encoding, "utf-8");
    }

    #[test]
    fn test_decode_windows_1252() {
        // "Garçon" 的 windows-1252 字节
        let bytes = [0x47, 0x61, 0x72, 0xE7, 0x6F, 0x6E];
        let decoded = RawText::decode(&bytes);
        assert_eq!(decoded.content, "Garçon");
        assert_eq!(decoded.encoding, "windows-1252");
    }

    #[test]
    fn test_escape_roundtrip() {
        let original = "Ares \"Predator\" <& friends> 'V'";
        let escaped = escape_text(original);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('"'));
        assert_eq!(unescape_text(&escaped).unwrap(), original);
    }

    #[test]
    fn test_unescape_char_references() {
        assert_eq!(unescape_text("&#65;&#x42;").unwrap(), "AB");
        assert_eq!(unescape_text("&#x72EA;").unwrap(), "狪");
    }

    #[test]
    fn test_unescape_invalid_entity() {
        assert!(unescape_text("&bogus;").is_err());
        assert!(unescape_text("&amp").is_err());
        assert!(unescape_text("&#xZZ;").is_err());
    }
}

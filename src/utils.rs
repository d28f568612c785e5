use thiserror::Error;
use std::path::{Path, PathBuf};

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Malformed document{}: {detail}{}", fmt_path(.path), fmt_pos(.line, .column))]
    MalformedDocument {
        path: Option<PathBuf>,
        line: usize,
        column: usize,
        detail: String,
    },

    #[error("Unsupported schema version \"{version}\"{} (supported: 1..={supported})", fmt_path(.path))]
    UnsupportedSchemaVersion {
        path: Option<PathBuf>,
        version: String,
        supported: u32,
    },

    #[error("Persist failure for {path:?}: {source}")]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// 错误消息中的路径片段（路径未知时为空）
fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" {:?}", p),
        None => String::new(),
    }
}

/// 错误消息中的位置片段（映射阶段的结构错误没有文本位置）
fn fmt_pos(line: &usize, column: &usize) -> String {
    if *line == 0 {
        String::new()
    } else {
        format!(" (line {}, column {})", line, column)
    }
}

impl SheetError {
    /// 构造不带路径上下文的解析错误
    pub fn malformed(line: usize, column: usize, detail: impl Into<String>) -> Self {
        SheetError::MalformedDocument {
            path: None,
            line,
            column,
            detail: detail.into(),
        }
    }

    /// 构造映射阶段的结构错误（树已解析成功，位置信息不再可用）
    pub fn structural(detail: impl Into<String>) -> Self {
        SheetError::malformed(0, 0, detail)
    }

    /// 为错误补充来源文件路径（加载入口处调用）
    pub fn with_path(self, file: &Path) -> Self {
        match self {
            SheetError::MalformedDocument { line, column, detail, .. } => {
                SheetError::MalformedDocument {
                    path: Some(file.to_path_buf()),
                    line,
                    column,
                    detail,
                }
            }
            SheetError::UnsupportedSchemaVersion { version, supported, .. } => {
                SheetError::UnsupportedSchemaVersion {
                    path: Some(file.to_path_buf()),
                    version,
                    supported,
                }
            }
            other => other,
        }
    }
}

/// 非致命加载警告
///
/// 肖像解码失败不会导致整个加载失败，记录仍然可用（肖像为空）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// 肖像数据无法解码
    PortraitDecode { reason: String },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::PortraitDecode { reason } => {
                write!(f, "肖像解码失败，已以空肖像继续加载: {}", reason)
            }
        }
    }
}

/// 创建文件备份
pub fn create_backup(file_path: &Path) -> Result<PathBuf, SheetError> {
    if !file_path.exists() {
        return Err(SheetError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "原文件不存在"
        )));
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let backup_path = file_path.with_extension(format!("{}.bak", timestamp));

    std::fs::copy(file_path, &backup_path)
        .map_err(SheetError::IoError)?;

    Ok(backup_path)
}

/// 检查字符串是否为合法的GUID形式 (8-4-4-4-12 十六进制)
pub fn is_valid_guid(text: &str) -> bool {
    let parts: Vec<&str> = text.split('-').collect();
    if parts.len() != 5 {
        return false;
    }

    let expected_lens = [8usize, 4, 4, 4, 12];
    parts.iter().zip(expected_lens.iter()).all(|(part, len)| {
        part.len() == *len && part.chars().all(|c| c.is_ascii_hexdigit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_validation() {
        // 有效GUID
        assert!(is_valid_guid("0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert!(is_valid_guid("00000000-0000-0000-0000-000000000000"));
        assert!(is_valid_guid("AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE"));

        // 无效GUID
        assert!(!is_valid_guid(""));
        assert!(!is_valid_guid("not-a-guid"));
        assert!(!is_valid_guid("0f8fad5bd9cb469fa16570867728950e"));
        assert!(!is_valid_guid("0f8fad5b-d9cb-469f-a165-7086772895"));
        assert!(!is_valid_guid("zzzzzzzz-d9cb-469f-a165-70867728950e"));
    }

    #[test]
    fn test_error_with_path() {
        let err = SheetError::malformed(3, 7, "unexpected token")
            .with_path(Path::new("broken.chr5"));

        match err {
            SheetError::MalformedDocument { path, line, column, .. } => {
                assert_eq!(path.unwrap(), PathBuf::from("broken.chr5"));
                assert_eq!(line, 3);
                assert_eq!(column, 7);
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
    }
}

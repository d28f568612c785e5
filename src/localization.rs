use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::utils::SheetError;

/// 默认语言（缺失翻译键的回退来源）
pub const DEFAULT_LANGUAGE: &str = "en";

/// 内置默认（英文）字符串表
///
/// 导出器在目标目录缺键时回退到这张表，保证导出永不因缺译失败。
/// 键名稳定，所有目录文件共用同一键空间。
const DEFAULT_STRINGS: &[(&str, &str)] = &[
    ("Title_CharacterSheet", "Character Sheet"),
    ("Label_Name", "Name"),
    ("Label_Metatype", "Metatype"),
    ("Label_Archetype", "Archetype"),
    ("Label_Stage", "Stage"),
    ("Stage_Build", "Build"),
    ("Stage_Career", "Career"),
    ("Section_Gear", "Gear"),
    ("Section_Skills", "Skills"),
    ("Section_Notes", "Notes"),
    ("Section_Portrait", "Portrait"),
    ("Label_Category", "Category"),
    ("Label_Quantity", "Qty"),
    ("Label_Rating", "Rating"),
    ("Label_Specialization", "Specialization"),
    ("Text_Unnamed", "(unnamed)"),
];

/// 查询内置默认字符串
pub fn default_string(key: &str) -> Option<&'static str> {
    DEFAULT_STRINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// 本地化目录
///
/// 一种语言一个目录文件（JSON），键空间与内置默认表一致。
/// 目录在一次导出期间是只读资源，导出器持有引用而非所有权，
/// 多个语言的导出可以并发使用各自的目录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizationCatalog {
    /// 语言标识（如 "en"、"de"、"zh-CN"）
    pub language: String,
    /// 消息键 -> 译文
    pub strings: HashMap<String, String>,
}

impl LocalizationCatalog {
    /// 创建空目录
    pub fn new(language: impl Into<String>) -> Self {
        LocalizationCatalog {
            language: language.into(),
            strings: HashMap::new(),
        }
    }

    /// 查询译文
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// 插入译文（构建测试目录用）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    /// 从 JSON 文本解析目录
    pub fn from_json_str(json: &str) -> Result<Self, SheetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从文件加载目录
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// 枚举目录下可用的语言
///
/// 扫描 `*.json` 目录文件，返回文件主名作为语言标识，按字典序排序。
/// 目录的发现方式是协作方约定：一种语言一个 `<locale>.json`。
pub fn list_available_locales(dir: &Path) -> Result<Vec<String>, SheetError> {
    let mut locales = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                locales.push(stem.to_string());
            }
        }
    }

    locales.sort();
    Ok(locales)
}

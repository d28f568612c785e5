/// 本地化目录文件 IO - 默认实现
use std::path::Path;

use super::traits::CatalogReader;
use crate::localization::LocalizationCatalog;

/// 默认目录读取器（JSON 文件）
pub struct DefaultCatalogReader;

impl CatalogReader for DefaultCatalogReader {
    fn read(&self, path: &Path) -> Result<LocalizationCatalog, Box<dyn std::error::Error>> {
        Ok(LocalizationCatalog::load(path)?)
    }
}

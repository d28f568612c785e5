/// IO 抽象层 - trait 定义
///
/// 该模块定义了文件读写的抽象接口，支持依赖注入和测试 mock。
/// 遵循依赖倒置原则（DIP），面向接口编程。

use std::path::Path;
use crate::localization::LocalizationCatalog;

/// 角色文档文件原始数据
#[derive(Debug, Clone)]
pub struct RawSheetData {
    /// 文件的原始字节数据
    pub bytes: Vec<u8>,
}

/// 角色文档读取 trait
///
/// # 职责
/// - 从文件系统读取 .chr5 文件的原始字节数据
/// - 不负责解析，仅负责 IO
pub trait SheetReader {
    /// 读取文档文件的原始数据
    ///
    /// # 参数
    /// * `path` - 文件路径
    ///
    /// # 返回
    /// 返回包含原始字节数据的 RawSheetData
    fn read(&self, path: &Path) -> Result<RawSheetData, Box<dyn std::error::Error>>;
}

/// 角色文档写入 trait
///
/// # 职责
/// - 将序列化后的文档文本写入文件系统
/// - 要求原子替换语义：写入失败时目标路径上不得留下半成品文件
/// - 不负责序列化，仅负责 IO
pub trait SheetWriter {
    /// 写入文档文本
    ///
    /// # 参数
    /// * `text` - 序列化后的文档文本
    /// * `path` - 目标文件路径
    fn write(&self, text: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>>;
}

/// 本地化目录读取 trait
///
/// # 职责
/// - 读取并解析一种语言的翻译目录文件
pub trait CatalogReader {
    /// 读取目录文件
    ///
    /// # 参数
    /// * `path` - 目录文件路径（JSON）
    fn read(&self, path: &Path) -> Result<LocalizationCatalog, Box<dyn std::error::Error>>;
}

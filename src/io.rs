/// IO 抽象层模块
///
/// 该模块提供了文件读写的抽象接口，遵循依赖倒置原则。
/// 支持依赖注入、测试 mock 和替换 IO 实现（如内存 IO、网络 IO 等）。
///
/// # 架构设计
///
/// - **traits**: 定义 Reader/Writer trait 接口
/// - **sheet_io**: 角色文档文件的默认实现（内存映射读取、原子替换写入）
/// - **catalog_io**: 本地化目录文件的默认实现
///
/// # 使用示例
///
/// ```rust,ignore
/// use charsheet::io::{DefaultSheetReader, SheetReader};
///
/// let reader = DefaultSheetReader;
/// let data = reader.read(Path::new("orc_decker.chr5"))?;
/// ```
pub mod traits;
pub mod sheet_io;
pub mod catalog_io;

// === 导出 trait 定义 ===
pub use traits::{CatalogReader, RawSheetData, SheetReader, SheetWriter};

// === 导出默认实现 ===
pub use catalog_io::DefaultCatalogReader;
pub use sheet_io::{AtomicSheetWriter, DefaultSheetReader};

/// 角色文档文件 IO - 默认实现
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;
use tempfile::NamedTempFile;

use super::traits::{RawSheetData, SheetReader, SheetWriter};

/// 默认文档读取器（内存映射）
pub struct DefaultSheetReader;

impl SheetReader for DefaultSheetReader {
    fn read(&self, path: &Path) -> Result<RawSheetData, Box<dyn std::error::Error>> {
        let file = std::fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            // 空文件无法建立映射
            return Ok(RawSheetData { bytes: Vec::new() });
        }
        // 内存映射读取，避免中间缓冲
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(RawSheetData { bytes: mmap.to_vec() })
    }
}

/// 原子替换文档写入器
///
/// 先写入目标目录下的临时文件，成功后原子地替换目标路径。
/// 任何一步失败都不会在目标路径留下半成品，原文件保持不变。
pub struct AtomicSheetWriter;

impl SheetWriter for AtomicSheetWriter {
    fn write(&self, text: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut temp = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new_in(".")?,
        };

        temp.write_all(text.as_bytes())?;
        temp.flush()?;
        // 同目录下的 rename 是原子替换
        temp.persist(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_write_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.chr5");

        let writer = AtomicSheetWriter;
        writer.write("<character version=\"3\" />\n", &path).unwrap();

        let reader = DefaultSheetReader;
        let data = reader.read(&path).unwrap();
        assert_eq!(data.bytes, b"<character version=\"3\" />\n");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.chr5");
        std::fs::write(&path, "old contents").unwrap();

        let writer = AtomicSheetWriter;
        writer.write("new contents", &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new contents");
        // 目录中不应残留临时文件
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_to_missing_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_such_dir").join("out.chr5");

        let writer = AtomicSheetWriter;
        assert!(writer.write("contents", &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_read_missing_file_fails() {
        let reader = DefaultSheetReader;
        assert!(reader.read(Path::new("does_not_exist.chr5")).is_err());
    }
}

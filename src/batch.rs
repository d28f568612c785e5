/// 批量处理模块
///
/// 对多份互相独立的文档并行执行加载/保存管线。不同记录之间没有
/// 共享可变状态，按文件并行是安全的；单个记录仍然只在一个线程上
/// 加载和保存。单个文件的失败不中止整批，按文件收集错误。
use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::diff::{compare_document_texts, DiffOptions, DocumentDifference};
use crate::loader::LoadOutcome;
use crate::saver::DiagnosticsLevel;
use crate::CharacterRecord;

/// 批量加载结果
#[derive(Debug)]
pub struct BatchOutcome {
    /// 成功加载的文件，保持输入顺序
    pub loaded: Vec<(PathBuf, LoadOutcome)>,
    /// 失败的文件及原因
    pub failures: Vec<(PathBuf, anyhow::Error)>,
}

/// 并行加载一组文档
pub fn load_all(paths: &[PathBuf]) -> BatchOutcome {
    let results: Vec<(PathBuf, anyhow::Result<LoadOutcome>)> = paths
        .par_iter()
        .map(|path| {
            let outcome = CharacterRecord::load(path)
                .with_context(|| format!("加载 {:?} 失败", path));
            (path.clone(), outcome)
        })
        .collect();

    let mut loaded = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(outcome) => loaded.push((path, outcome)),
            Err(e) => failures.push((path, e)),
        }
    }

    BatchOutcome { loaded, failures }
}

/// 并行把一组文档重存到输出目录（文件名不变）
pub fn resave_all(paths: &[PathBuf], output_dir: &Path) -> BatchOutcome {
    let results: Vec<(PathBuf, anyhow::Result<LoadOutcome>)> = paths
        .par_iter()
        .map(|path| {
            let result = (|| -> anyhow::Result<LoadOutcome> {
                let outcome = CharacterRecord::load(path)
                    .with_context(|| format!("加载 {:?} 失败", path))?;

                let file_name = path
                    .file_name()
                    .ok_or_else(|| anyhow::anyhow!("路径没有文件名: {:?}", path))?;
                let destination = output_dir.join(file_name);
                outcome
                    .record
                    .save(&destination, DiagnosticsLevel::Quiet)
                    .with_context(|| format!("保存 {:?} 失败", destination))?;

                Ok(outcome)
            })();
            (path.clone(), result)
        })
        .collect();

    let mut loaded = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(outcome) => loaded.push((path, outcome)),
            Err(e) => failures.push((path, e)),
        }
    }

    BatchOutcome { loaded, failures }
}

/// 单个文件的双循环收敛报告
#[derive(Debug)]
pub struct ConvergenceReport {
    /// 被检验的文件
    pub path: PathBuf,
    /// 排除肖像节点后的结构差异
    pub differences: Vec<DocumentDifference>,
}

impl ConvergenceReport {
    /// 两次加载/保存循环是否收敛
    pub fn passed(&self) -> bool {
        self.differences.is_empty()
    }
}

/// 批量收敛检验结果
#[derive(Debug)]
pub struct ConvergenceOutcome {
    pub reports: Vec<ConvergenceReport>,
    pub failures: Vec<(PathBuf, anyhow::Error)>,
}

/// 对单个文档做双循环检验
///
/// d1 = save(load(d)), d2 = save(load(d1))，排除 `mugshot` 节点后
/// 比较 d1 与 d2 的结构差异。空差异即收敛。
pub fn verify_double_cycle(path: &Path) -> anyhow::Result<ConvergenceReport> {
    let first = CharacterRecord::load(path)
        .with_context(|| format!("第一次加载 {:?} 失败", path))?;
    let d1 = first
        .record
        .to_document_text()
        .context("第一次序列化失败")?;

    let second = CharacterRecord::from_document_text(&d1)
        .context("第二次加载失败（第一次保存的输出无法重新加载）")?;
    let d2 = second
        .record
        .to_document_text()
        .context("第二次序列化失败")?;

    let differences = compare_document_texts(&d1, &d2, &DiffOptions::default())
        .context("结构对比失败")?;

    Ok(ConvergenceReport {
        path: path.to_path_buf(),
        differences,
    })
}

/// 并行对一组文档做双循环检验
pub fn verify_all(paths: &[PathBuf]) -> ConvergenceOutcome {
    let results: Vec<(PathBuf, anyhow::Result<ConvergenceReport>)> = paths
        .par_iter()
        .map(|path| (path.clone(), verify_double_cycle(path)))
        .collect();

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => failures.push((path, e)),
        }
    }

    ConvergenceOutcome { reports, failures }
}

/// 收集目录下的所有 .chr5 文件，按文件名排序
pub fn collect_documents(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let extension = path.extension().and_then(|e| e.to_str());
        if crate::SUPPORTED_EXTENSIONS
            .iter()
            .any(|ext| Some(*ext) == extension)
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

use clap::Parser;
use std::path::PathBuf;

use charsheet::batch;
use charsheet::diff::{compare_document_texts, DiffOptions};
use charsheet::localization::{list_available_locales, LocalizationCatalog};
use charsheet::saver::DiagnosticsLevel;
use charsheet::utils::create_backup;
use charsheet::{CharacterRecord, Exporter, SUPPORTED_EXTENSIONS};

#[derive(Parser)]
#[command(name = "charsheet")]
#[command(about = "角色文档的加载/保存/导出与往返校验工具")]
#[command(version = "0.3.0")]
struct Cli {
    /// 输入 .chr5 文档路径（批量模式下为目录）
    #[arg(short, long)]
    input: PathBuf,

    /// 重存模式：加载后规范化保存到指定路径（与输入相同则先备份）
    #[arg(long)]
    resave: Option<PathBuf>,

    /// 导出模式：目标语言标识
    #[arg(long)]
    export: Option<String>,

    /// 本地化目录所在目录（默认 locales/）
    #[arg(long, default_value = "locales")]
    catalog_dir: PathBuf,

    /// 导出输出路径（缺省输出到标准输出）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 对比模式：与另一份文档做结构对比（排除肖像节点）
    #[arg(long)]
    compare: Option<PathBuf>,

    /// 校验模式：双循环收敛检验（d1 = save(load(d)), d2 = save(load(d1))）
    #[arg(long)]
    verify: bool,

    /// 批量校验模式：输入目录下所有文档并行做双循环检验
    #[arg(long)]
    batch_verify: bool,

    /// 列出可用语言后退出
    #[arg(long)]
    list_locales: bool,

    /// 显示记录统计信息
    #[arg(long)]
    stats: bool,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.list_locales {
        return handle_list_locales(&cli);
    }
    if cli.batch_verify {
        return handle_batch_verify(&cli);
    }

    validate_input(&cli.input)?;

    if cli.verify {
        return handle_verify(&cli);
    }
    if let Some(other) = &cli.compare {
        return handle_compare(&cli, other);
    }
    if let Some(locale) = &cli.export {
        return handle_export(&cli, locale);
    }
    if let Some(destination) = &cli.resave {
        return handle_resave(&cli, destination);
    }

    // 默认模式：加载并显示摘要
    handle_stats(&cli)
}

/// 验证输入文件
fn validate_input(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("输入文件不存在: {:?}", input).into());
    }

    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if !SUPPORTED_EXTENSIONS
        .iter()
        .any(|&ext| Some(ext) == extension.as_deref())
    {
        return Err("输入文件必须是 .chr5 文档".into());
    }

    Ok(())
}

/// 加载输入并打印警告
fn load_input(cli: &Cli) -> Result<CharacterRecord, Box<dyn std::error::Error>> {
    let outcome = CharacterRecord::load(&cli.input)?;
    if !cli.quiet {
        for warning in &outcome.warnings {
            eprintln!("警告: {}", warning);
        }
    }
    Ok(outcome.record)
}

fn handle_stats(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let record = load_input(cli)?;
    println!("{}", record.summary());

    if cli.stats {
        if let Some(arena) = &record.gear {
            println!("装备树最大嵌套: {} 层", arena.max_depth());
        }
        if !record.extensions.is_empty() {
            let names: Vec<&str> = record
                .extensions
                .iter()
                .map(|e| e.name.as_str())
                .collect();
            println!("扩展节点: {}", names.join(", "));
        }
    }
    Ok(())
}

fn handle_resave(cli: &Cli, destination: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let record = load_input(cli)?;

    // 覆盖输入文件前先留备份
    if destination == &cli.input {
        let backup = create_backup(&cli.input)?;
        if !cli.quiet {
            println!("已创建备份文件: {:?}", backup);
        }
    }

    let level = if cli.quiet {
        DiagnosticsLevel::Quiet
    } else if cli.stats {
        DiagnosticsLevel::Verbose
    } else {
        DiagnosticsLevel::Standard
    };

    let report = record.save(destination, level)?;
    for message in &report.messages {
        println!("{}", message);
    }
    Ok(())
}

fn handle_export(cli: &Cli, locale: &str) -> Result<(), Box<dyn std::error::Error>> {
    let record = load_input(cli)?;

    let catalog_path = cli.catalog_dir.join(format!("{}.json", locale));
    let catalog = if catalog_path.exists() {
        LocalizationCatalog::load(&catalog_path)?
    } else {
        if !cli.quiet {
            eprintln!(
                "警告: 未找到语言 {} 的目录文件 {:?}，全部回退到默认语言",
                locale, catalog_path
            );
        }
        LocalizationCatalog::new(locale)
    };

    let outcome = Exporter::new(locale, &catalog).export(&record);
    let text = outcome.to_text();

    match &cli.output {
        Some(path) => std::fs::write(path, &text)?,
        None => print!("{}", text),
    }

    if !cli.quiet && !outcome.diagnostics.missing_keys.is_empty() {
        eprintln!(
            "缺失翻译键 {} 个: {}",
            outcome.diagnostics.missing_keys.len(),
            outcome.diagnostics.missing_keys.join(", ")
        );
    }
    Ok(())
}

fn handle_compare(cli: &Cli, other: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let control = std::fs::read_to_string(&cli.input)?;
    let test = std::fs::read_to_string(other)?;

    let differences = compare_document_texts(&control, &test, &DiffOptions::default())?;
    if differences.is_empty() {
        println!("两份文档结构一致（已排除肖像节点）");
        return Ok(());
    }

    println!("发现 {} 处结构差异:", differences.len());
    for difference in &differences {
        println!("  {}", difference);
    }
    Err(format!("{} 处结构差异", differences.len()).into())
}

fn handle_verify(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let report = batch::verify_double_cycle(&cli.input)?;
    if report.passed() {
        if !cli.quiet {
            println!("✓ 双循环收敛: {:?}", cli.input);
        }
        Ok(())
    } else {
        for difference in &report.differences {
            eprintln!("  {}", difference);
        }
        Err(format!("双循环不收敛: {} 处差异", report.differences.len()).into())
    }
}

fn handle_batch_verify(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_dir() {
        return Err(format!("批量模式需要目录: {:?}", cli.input).into());
    }

    let paths = batch::collect_documents(&cli.input)?;
    if paths.is_empty() {
        return Err("目录下没有 .chr5 文档".into());
    }

    let outcome = batch::verify_all(&paths);

    let mut failed = 0usize;
    for report in &outcome.reports {
        if report.passed() {
            if !cli.quiet {
                println!("✓ {:?}", report.path);
            }
        } else {
            failed += 1;
            println!("✗ {:?}: {} 处差异", report.path, report.differences.len());
        }
    }
    for (path, error) in &outcome.failures {
        failed += 1;
        println!("✗ {:?}: {:#}", path, error);
    }

    if failed == 0 {
        println!("{} 份文档全部收敛", outcome.reports.len());
        Ok(())
    } else {
        Err(format!("{} 份文档未通过", failed).into())
    }
}

fn handle_list_locales(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let locales = list_available_locales(&cli.catalog_dir)?;
    if locales.is_empty() {
        println!("{:?} 下没有目录文件", cli.catalog_dir);
    } else {
        for locale in locales {
            println!("{}", locale);
        }
    }
    Ok(())
}

use crate::error::Error;
use crate::extractor::filter_lines;
use crate::ipc::{self, CtaIpcSample};
use crate::segmenter::split_into_kernels;
use color_eyre::eyre::{self, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 压缩日志文件后缀
pub const LOG_SUFFIX: &str = ".log.gz";

/// 输出文件（写入当前工作目录）
pub const OUTPUT_FILE: &str = "data_out.json";

/// 每个日志文件（应用）的统计结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStat {
    pub app_path: String,
    /// 每个 kernel 的 IPC，按 kernel 顺序
    pub kernel_ipcs: Vec<f64>,
    /// 每个收敛 kernel 的第一个收敛 CTA IPC 采样
    pub cta_ipcs: Vec<CtaIpcSample>,
    pub app_ipc: f64,
}

/// 递归查找目录下所有压缩日志，按路径排序
pub fn find_logs(directory: &Path) -> Result<Vec<PathBuf>, Error> {
    if !directory.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: directory.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    for entry in walkdir::WalkDir::new(directory) {
        let entry = entry.map_err(|source| Error::Walk {
            path: directory.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(LOG_SUFFIX) {
            paths.push(entry.into_path());
        }
    }

    if paths.is_empty() {
        return Err(Error::SuffixMismatch {
            path: directory.to_path_buf(),
            suffix: LOG_SUFFIX,
        });
    }

    paths.sort();
    Ok(paths)
}

/// 分析单个日志文件：提取计数、切分 kernel、计算 IPC
pub fn analyze_app(path: &Path, sample_freq: u64) -> Result<AppStat, Error> {
    let series = filter_lines(path)?;
    let segments = split_into_kernels(&series, sample_freq)?;

    let mut kernel_ipcs = Vec::with_capacity(segments.len());
    let mut unfiltered_cta_ipcs = Vec::with_capacity(segments.len());
    for (kernel_id, kernel) in segments.iter().enumerate() {
        kernel_ipcs.push(ipc::kernel_ipc(kernel, kernel_id)?);
        unfiltered_cta_ipcs.push(ipc::extract_cta_ipcs(kernel, kernel_id)?);
    }

    let cta_ipcs = ipc::filter_converged(&unfiltered_cta_ipcs, &kernel_ipcs)?;
    let app_ipc = ipc::app_ipc(&segments)?;

    log::info!(
        "{}: {} samples, {} kernels ({} converged), app IPC {:.4}",
        path.display(),
        series.len(),
        segments.len(),
        cta_ipcs.len(),
        app_ipc
    );

    Ok(AppStat {
        app_path: path.to_string_lossy().to_string(),
        kernel_ipcs,
        cta_ipcs,
        app_ipc,
    })
}

/// 分析目录下所有日志，任一文件失败即中止
pub fn analyze_apps(directory: &Path, sample_freq: u64) -> eyre::Result<Vec<AppStat>> {
    let paths = find_logs(directory)?;
    log::info!(
        "found {} logs under {} (sample frequency {})",
        paths.len(),
        directory.display(),
        sample_freq
    );

    let mut stats = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        log::debug!("[{}/{}] processing {}", i + 1, paths.len(), path.display());
        let stat = analyze_app(path, sample_freq)
            .wrap_err_with(|| eyre::eyre!("failed to analyze {}", path.display()))?;
        stats.push(stat);
    }
    Ok(stats)
}

/// 将所有统计结果写入 JSON 文件
pub fn write_json(stats: &[AppStat], output_file: &Path) -> Result<(), Error> {
    log::info!("writing {} app stats to {}", stats.len(), output_file.display());
    let write_err = |source| Error::Write {
        path: output_file.to_path_buf(),
        source,
    };
    let file = File::create(output_file).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, stats).map_err(|source| Error::Serialize {
        path: output_file.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(write_err)?;
    Ok(())
}

/// 保留路径末尾，超长时前面用 "..." 表示
fn truncate_path(path: &str, width: usize) -> String {
    let len = path.chars().count();
    if len <= width {
        return path.to_string();
    }
    let tail: String = path.chars().skip(len - (width - 3)).collect();
    format!("...{tail}")
}

/// 打印预览
pub fn print_preview(stats: &[AppStat], count: usize) {
    if stats.is_empty() {
        return;
    }
    println!("\n--- Preview (first {} apps) ---", count.min(stats.len()));
    println!(
        "{:<50} {:>8} {:>10} {:>10}",
        "App", "Kernels", "Converged", "App IPC"
    );
    println!("{}", "-".repeat(81));

    for stat in stats.iter().take(count) {
        println!(
            "{:<50} {:>8} {:>10} {:>10.4}",
            truncate_path(&stat.app_path, 50),
            stat.kernel_ipcs.len(),
            stat.cta_ipcs.len(),
            stat.app_ipc
        );
    }
}

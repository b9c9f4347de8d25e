use crate::error::Error;
use crate::extractor::RawCounterSeries;
use crate::segmenter::KernelSegments;
use serde::{Deserialize, Serialize};

/// CTA IPC 与 kernel IPC 的相对差小于该值即视为收敛
pub const CONVERGENCE_THRESHOLD: f64 = 0.1;

/// CTA 完成时刻的 IPC 采样，序列化为 `[cycle, ctas_completed, ipc]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(u64, u64, f64)", into = "(u64, u64, f64)")]
pub struct CtaIpcSample {
    pub cycle: u64,
    /// 本 kernel 内累计完成的 CTA 数
    pub ctas_completed: u64,
    pub ipc: f64,
}

impl From<(u64, u64, f64)> for CtaIpcSample {
    fn from((cycle, ctas_completed, ipc): (u64, u64, f64)) -> Self {
        Self {
            cycle,
            ctas_completed,
            ipc,
        }
    }
}

impl From<CtaIpcSample> for (u64, u64, f64) {
    fn from(sample: CtaIpcSample) -> Self {
        (sample.cycle, sample.ctas_completed, sample.ipc)
    }
}

fn ipc(instructions: u64, cycles: u64, what: impl FnOnce() -> String) -> Result<f64, Error> {
    if cycles == 0 {
        return Err(Error::DivideByZero(what()));
    }
    Ok(instructions as f64 / cycles as f64)
}

/// 最后一个采样的 (cycles, instructions)
fn last_sample(kernel: &RawCounterSeries) -> Result<(u64, u64), Error> {
    match (kernel.cycles.last(), kernel.instructions.last()) {
        (Some(&cycles), Some(&instructions)) => Ok((cycles, instructions)),
        _ => Err(Error::EmptyInput),
    }
}

/// 整个 kernel 的 IPC：最后一个采样的指令数 / 周期数
pub fn kernel_ipc(kernel: &RawCounterSeries, kernel_id: usize) -> Result<f64, Error> {
    let (cycles, instructions) = last_sample(kernel)?;
    ipc(instructions, cycles, || format!("IPC of kernel {kernel_id}"))
}

/// 应用 IPC：所有 kernel 最后指令数之和 / 最后周期数之和（按指令加权，而非 kernel IPC 的平均值）
pub fn app_ipc(segments: &KernelSegments) -> Result<f64, Error> {
    let mut app_cycles = 0;
    let mut app_instructions = 0;
    for kernel in segments.iter() {
        let (cycles, instructions) = last_sample(kernel)?;
        app_cycles += cycles;
        app_instructions += instructions;
    }
    ipc(app_instructions, app_cycles, || "application IPC".to_string())
}

/// 提取 kernel 内每个有 CTA 完成的采样点的 (cycle, 累计 CTA 数, IPC)
pub fn extract_cta_ipcs(
    kernel: &RawCounterSeries,
    kernel_id: usize,
) -> Result<Vec<CtaIpcSample>, Error> {
    let mut samples = Vec::new();
    let mut ctas_completed = 0;

    for (cycle, instructions, ctas) in kernel.samples() {
        if ctas == 0 {
            continue;
        }
        ctas_completed += ctas;
        let ipc = ipc(instructions, cycle, || {
            format!("CTA IPC of kernel {kernel_id} at sample with {ctas_completed} CTAs")
        })?;
        samples.push(CtaIpcSample {
            cycle,
            ctas_completed,
            ipc,
        });
    }

    Ok(samples)
}

/// 返回第一个与 kernel IPC 相对差小于阈值的 CTA IPC 采样
pub fn first_converged(
    samples: &[CtaIpcSample],
    kernel_ipc: f64,
    kernel_id: usize,
) -> Result<Option<CtaIpcSample>, Error> {
    if samples.is_empty() {
        return Ok(None);
    }
    if kernel_ipc == 0.0 {
        return Err(Error::DivideByZero(format!(
            "relative CTA IPC difference of kernel {kernel_id} (kernel IPC is zero)"
        )));
    }
    Ok(samples
        .iter()
        .find(|sample| (sample.ipc - kernel_ipc).abs() / kernel_ipc < CONVERGENCE_THRESHOLD)
        .copied())
}

/// 对每个 kernel 选出第一个收敛的 CTA IPC 采样
///
/// 没有收敛采样的 kernel 不产生条目，因此结果可能比 kernel 数少。
pub fn filter_converged(
    per_kernel: &[Vec<CtaIpcSample>],
    kernel_ipcs: &[f64],
) -> Result<Vec<CtaIpcSample>, Error> {
    if per_kernel.len() != kernel_ipcs.len() {
        return Err(Error::KernelCountMismatch {
            samples: per_kernel.len(),
            kernels: kernel_ipcs.len(),
        });
    }

    let mut converged = Vec::new();
    for (kernel_id, (samples, &kernel_ipc)) in per_kernel.iter().zip(kernel_ipcs).enumerate() {
        match first_converged(samples, kernel_ipc, kernel_id)? {
            Some(sample) => converged.push(sample),
            None => log::debug!("kernel {kernel_id}: no CTA IPC within threshold of {kernel_ipc}"),
        }
    }
    Ok(converged)
}

use crate::error::Error;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// 周期计数标记
pub const CYCLE_MARKER: &str = "globalcyclecount";
/// 指令计数标记
pub const INSTRUCTION_MARKER: &str = "globalinsncount";
/// 已完成 CTA 计数标记
pub const CTA_MARKER: &str = "ctas_completed";

/// 原始计数序列：每条采样日志行对应一个条目，三个序列按下标对齐
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCounterSeries {
    pub cycles: Vec<u64>,
    pub instructions: Vec<u64>,
    pub ctas: Vec<u64>,
}

impl RawCounterSeries {
    pub fn push(&mut self, cycle: u64, instructions: u64, ctas: u64) {
        self.cycles.push(cycle);
        self.instructions.push(instructions);
        self.ctas.push(ctas);
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// 检查三个序列长度一致，返回采样数
    pub fn aligned_len(&self) -> Result<usize, Error> {
        let cycles = self.cycles.len();
        if self.instructions.len() != cycles || self.ctas.len() != cycles {
            return Err(Error::MisalignedSeries {
                cycles,
                instructions: self.instructions.len(),
                ctas: self.ctas.len(),
            });
        }
        Ok(cycles)
    }

    /// 按下标遍历 (cycle, instructions, ctas) 采样
    pub fn samples(&self) -> impl Iterator<Item = (u64, u64, u64)> + '_ {
        self.cycles
            .iter()
            .zip(&self.instructions)
            .zip(&self.ctas)
            .map(|((&cycle, &instructions), &ctas)| (cycle, instructions, ctas))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
    Cycles,
    Instructions,
    Ctas,
}

fn match_marker(line: &str) -> Option<Counter> {
    if line.contains(CYCLE_MARKER) {
        Some(Counter::Cycles)
    } else if line.contains(INSTRUCTION_MARKER) {
        Some(Counter::Instructions)
    } else if line.contains(CTA_MARKER) {
        Some(Counter::Ctas)
    } else {
        None
    }
}

/// 取第一个 ':' 之后、下一个 ':' 之前的数值，如 "globalcyclecount: 1000"
fn parse_counter_value(line: &str, line_number: usize, path: &Path) -> Result<u64, Error> {
    let value = line.split(':').nth(1).ok_or_else(|| Error::MissingValue {
        path: path.to_path_buf(),
        line_number,
        line: line.to_string(),
    })?;
    value.trim().parse::<u64>().map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        line_number,
        line: line.to_string(),
        source,
    })
}

/// 从解压后的日志文本中提取计数序列
///
/// `path` 只用于错误信息。
pub fn parse_counters(text: &str, path: &Path) -> Result<RawCounterSeries, Error> {
    let mut series = RawCounterSeries::default();

    for (idx, line) in text.lines().enumerate() {
        let Some(counter) = match_marker(line) else {
            continue;
        };
        let value = parse_counter_value(line, idx + 1, path)?;
        match counter {
            Counter::Cycles => series.cycles.push(value),
            Counter::Instructions => series.instructions.push(value),
            Counter::Ctas => series.ctas.push(value),
        }
    }

    Ok(series)
}

/// 读取整个 gzip 日志到内存
pub fn read_log(path: &Path) -> Result<String, Error> {
    let read_err = |source| Error::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(file));
    let mut text = String::new();
    decoder.read_to_string(&mut text).map_err(read_err)?;
    Ok(text)
}

/// 从 gzip 日志文件中提取周期、指令与 CTA 计数
pub fn filter_lines(path: &Path) -> Result<RawCounterSeries, Error> {
    let text = read_log(path)?;
    log::debug!("{}: read {} bytes", path.display(), text.len());

    let series = parse_counters(&text, path)?;
    log::debug!(
        "{}: {} cycle, {} instruction, {} cta samples",
        path.display(),
        series.cycles.len(),
        series.instructions.len(),
        series.ctas.len()
    );
    Ok(series)
}

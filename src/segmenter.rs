use crate::error::Error;
use crate::extractor::RawCounterSeries;

/// 按 kernel 调用切分后的计数序列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelSegments {
    pub kernels: Vec<RawCounterSeries>,
}

impl KernelSegments {
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawCounterSeries> {
        self.kernels.iter()
    }
}

/// 将计数序列切分为每次 kernel 调用的子序列
///
/// 每个 kernel 的第一个采样周期总是等于 `sample_freq`，
/// 当前分组非空时遇到该值即开始新的 kernel。
/// 每个 kernel 的第一个 CTA 完成数来自上一个 kernel 的收尾，统一置零。
pub fn split_into_kernels(
    series: &RawCounterSeries,
    sample_freq: u64,
) -> Result<KernelSegments, Error> {
    if series.aligned_len()? == 0 {
        return Err(Error::EmptyInput);
    }

    let mut kernels = Vec::new();
    let mut current = RawCounterSeries::default();

    for (cycle, instructions, ctas) in series.samples() {
        if cycle == sample_freq && !current.is_empty() {
            kernels.push(std::mem::take(&mut current));
        }
        current.push(cycle, instructions, ctas);
    }
    kernels.push(current);

    for kernel in &mut kernels {
        if let Some(first) = kernel.ctas.first_mut() {
            *first = 0;
        }
    }

    Ok(KernelSegments { kernels })
}

#[cfg(test)]
mod tests {
    use super::split_into_kernels;
    use crate::error::Error;
    use crate::extractor::RawCounterSeries;
    use similar_asserts as diff;

    fn series(cycles: &[u64], instructions: &[u64], ctas: &[u64]) -> RawCounterSeries {
        RawCounterSeries {
            cycles: cycles.to_vec(),
            instructions: instructions.to_vec(),
            ctas: ctas.to_vec(),
        }
    }

    #[test]
    fn test_split_two_kernels() {
        let raw = series(
            &[1000, 1500, 2000, 1000, 1200],
            &[10, 20, 30, 40, 50],
            &[4, 1, 0, 2, 3],
        );
        let segments = split_into_kernels(&raw, 1000).unwrap();
        let sizes: Vec<_> = segments.iter().map(RawCounterSeries::len).collect();
        diff::assert_eq!(have: sizes, want: vec![3, 2]);
        diff::assert_eq!(
            have: segments.kernels,
            want: vec![
                series(&[1000, 1500, 2000], &[10, 20, 30], &[0, 1, 0]),
                series(&[1000, 1200], &[40, 50], &[0, 3]),
            ]
        );
    }

    #[test]
    fn test_first_sample_does_not_start_empty_kernel() {
        let raw = series(&[1000, 1000, 1000], &[1, 2, 3], &[5, 5, 5]);
        let segments = split_into_kernels(&raw, 1000).unwrap();
        assert_eq!(segments.len(), 3);
        for kernel in segments.iter() {
            diff::assert_eq!(have: kernel.ctas.clone(), want: vec![0]);
        }
    }

    #[test]
    fn test_no_boundary_is_single_kernel() {
        let raw = series(&[500, 900, 1300], &[1, 2, 3], &[1, 1, 1]);
        let segments = split_into_kernels(&raw, 1000).unwrap();
        assert_eq!(segments.len(), 1);
        diff::assert_eq!(have: segments.kernels[0].ctas.clone(), want: vec![0, 1, 1]);
    }

    #[test]
    fn test_sample_counts_are_preserved() {
        let cycles = [1000, 2000, 3000, 1000, 1000, 2000, 3000, 4000, 1000];
        let raw = series(&cycles, &[7; 9], &[1; 9]);
        let segments = split_into_kernels(&raw, 1000).unwrap();
        let total: usize = segments.iter().map(RawCounterSeries::len).sum();
        assert_eq!(total, cycles.len());
        assert!(segments.iter().all(|kernel| kernel.ctas[0] == 0));

        let concatenated: Vec<u64> = segments
            .iter()
            .flat_map(|kernel| kernel.cycles.iter().copied())
            .collect();
        diff::assert_eq!(have: concatenated, want: cycles.to_vec());
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let err = split_into_kernels(&RawCounterSeries::default(), 1000).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_misaligned_series_is_rejected() {
        let raw = series(&[1000, 1500], &[10], &[0, 1]);
        let err = split_into_kernels(&raw, 1000).unwrap_err();
        assert!(matches!(
            err,
            Error::MisalignedSeries {
                cycles: 2,
                instructions: 1,
                ctas: 2
            }
        ));
    }
}

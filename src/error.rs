use std::path::PathBuf;

/// 统计流程中的错误
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("input directory {path:?} does not exist or is not a directory")]
    DirectoryNotFound { path: PathBuf },
    #[error("failed to walk {path:?}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("no files ending in {suffix:?} found under {path:?}")]
    SuffixMismatch { path: PathBuf, suffix: &'static str },
    #[error("could not read {path:?}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path:?}:{line_number}: missing ':' before counter value in {line:?}")]
    MissingValue {
        path: PathBuf,
        line_number: usize,
        line: String,
    },
    #[error("{path:?}:{line_number}: invalid counter value in {line:?}")]
    Parse {
        path: PathBuf,
        line_number: usize,
        line: String,
        source: std::num::ParseIntError,
    },
    #[error("no counter samples found")]
    EmptyInput,
    #[error(
        "counter series have different lengths \
        (cycles={cycles}, instructions={instructions}, ctas={ctas})"
    )]
    MisalignedSeries {
        cycles: usize,
        instructions: usize,
        ctas: usize,
    },
    #[error("got CTA IPC samples for {samples} kernels but IPCs for {kernels} kernels")]
    KernelCountMismatch { samples: usize, kernels: usize },
    #[error("division by zero while computing {0}")]
    DivideByZero(String),
    #[error("could not write {path:?}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize stats to {path:?}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

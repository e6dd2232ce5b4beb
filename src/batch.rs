//! Batch timezone resolution.
//!
//! A [`Resolver`] holds a k-d tree built from every labelled record of a
//! dataset. Unlabelled records are matched against their nearest labelled
//! neighbour and take its timezone when it lies within the configured threshold.
//! Work is split into contiguous partitions, one per worker thread; every worker
//! queries the same tree, which is never mutated after construction.

use crate::compute::spatial::KdTree;
use crate::config::{Config, ThresholdMetric};
use crate::error::{Result, TzError};
use crate::reader::read_lines;
use crate::record::Record;
use nearest_tz_types::Location;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

/// Counters describing what happened to the lines of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Lines looked at
    pub total: usize,
    /// Lines that already had a timezone and were passed through
    pub labeled: usize,
    /// Unlabelled lines that received a timezone
    pub resolved: usize,
    /// Unlabelled lines whose nearest match was too far (or absent); dropped
    pub rejected: usize,
    /// Lines that could not be parsed; dropped
    pub malformed: usize,
}

impl AddAssign for BatchStats {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.labeled += other.labeled;
        self.resolved += other.resolved;
        self.rejected += other.rejected;
        self.malformed += other.malformed;
    }
}

/// Outcome of resolving one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Already labelled, emitted unchanged
    Labeled(String),
    /// Label substituted from the nearest neighbour
    Resolved { line: String, distance_km: f64 },
    /// No labelled point within the threshold
    Rejected { distance_km: Option<f64> },
    Malformed,
}

/// The resolved output of one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub index: usize,
    pub lines: Vec<String>,
    pub stats: BatchStats,
}

/// Summary of a full file run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub outputs: Vec<PathBuf>,
    pub stats: BatchStats,
}

/// Assigns timezones to unlabelled records from the nearest labelled record.
#[derive(Debug)]
pub struct Resolver {
    tree: KdTree<Location>,
    config: Config,
    malformed_reference: usize,
}

impl Resolver {
    /// Build a resolver whose reference set is every labelled line of `lines`.
    ///
    /// Malformed lines are logged and skipped.
    ///
    /// # Errors
    ///
    /// `TzError::InvalidConfig` if `config` does not validate.
    pub fn from_lines<S: AsRef<str>>(lines: &[S], config: Config) -> Result<Self> {
        config.validate().map_err(TzError::InvalidConfig)?;

        let mut malformed = 0;
        let mut reference = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            match Record::parse(line.as_ref(), &config.undefined_marker, i + 1) {
                Ok(record) if record.is_labeled() => reference.push(record.to_location()),
                Ok(_) => {}
                Err(e) => {
                    log::warn!("{}", e);
                    malformed += 1;
                }
            }
        }

        log::info!("Feeding kdtree with {} labelled locations", reference.len());
        Ok(Self::from_locations(reference, config, malformed))
    }

    /// Build a resolver from already-parsed labelled locations.
    ///
    /// Locations without a timezone are ignored.
    pub fn from_reference(locations: Vec<Location>, config: Config) -> Result<Self> {
        config.validate().map_err(TzError::InvalidConfig)?;
        let labeled = locations
            .into_iter()
            .filter(|l| l.timezone().is_some())
            .collect();
        Ok(Self::from_locations(labeled, config, 0))
    }

    fn from_locations(locations: Vec<Location>, config: Config, malformed: usize) -> Self {
        Self {
            tree: KdTree::build(locations),
            config,
            malformed_reference: malformed,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The reference index.
    pub fn tree(&self) -> &KdTree<Location> {
        &self.tree
    }

    /// Number of lines that were skipped as malformed while building the reference set.
    pub fn malformed_reference(&self) -> usize {
        self.malformed_reference
    }

    /// Distance to `matched` under the configured metric.
    fn measure(&self, query: &Location, matched: &Location, chord_km: f64) -> f64 {
        match self.config.metric {
            ThresholdMetric::Chord => chord_km,
            ThresholdMetric::GreatCircle => query.great_circle_km(matched),
        }
    }

    /// Resolve a single line. `number` is only used for error reporting.
    pub fn resolve_line(&self, line: &str, number: usize) -> Resolution {
        let record = match Record::parse(line, &self.config.undefined_marker, number) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{}", e);
                return Resolution::Malformed;
            }
        };
        if record.is_labeled() {
            return Resolution::Labeled(line.to_string());
        }

        let query = record.to_location();
        let nearest = match self.tree.nearest(&query) {
            Ok(nearest) => nearest,
            Err(e) => {
                log::warn!("line {}: {}", number, e);
                return Resolution::Malformed;
            }
        };
        let Some(nearest) = nearest else {
            return Resolution::Rejected { distance_km: None };
        };

        let distance_km = self.measure(&query, nearest.point, nearest.distance);
        match nearest.point.timezone() {
            Some(timezone) if distance_km < self.config.threshold_km => Resolution::Resolved {
                line: record.with_timezone(timezone),
                distance_km,
            },
            _ => Resolution::Rejected {
                distance_km: Some(distance_km),
            },
        }
    }

    /// Resolve a contiguous slice of lines. `first_line` is the 1-based number of
    /// `lines[0]` in the whole input.
    pub fn resolve_partition<S: AsRef<str>>(
        &self,
        index: usize,
        lines: &[S],
        first_line: usize,
    ) -> Partition {
        let mut stats = BatchStats::default();
        let mut output = Vec::with_capacity(lines.len());

        for (offset, line) in lines.iter().enumerate() {
            stats.total += 1;
            match self.resolve_line(line.as_ref(), first_line + offset) {
                Resolution::Labeled(line) => {
                    stats.labeled += 1;
                    output.push(line);
                }
                Resolution::Resolved { line, .. } => {
                    stats.resolved += 1;
                    output.push(line);
                }
                Resolution::Rejected { .. } => stats.rejected += 1,
                Resolution::Malformed => stats.malformed += 1,
            }
        }

        Partition {
            index,
            lines: output,
            stats,
        }
    }

    /// Split `lines` into one contiguous chunk per worker and resolve the chunks
    /// in parallel. Partitions come back in input order.
    ///
    /// # Errors
    ///
    /// `TzError::WorkerPanicked` if a worker thread panicked.
    pub fn resolve_partitioned<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Result<Vec<Partition>> {
        let ranges = partition_ranges(lines.len(), self.config.effective_workers());
        log::info!(
            "Number of jobs: {}, elements per job: ~{}",
            ranges.len(),
            ranges.first().map_or(0, |r| r.len())
        );

        std::thread::scope(|scope| {
            let handles: Vec<_> = ranges
                .into_iter()
                .enumerate()
                .map(|(index, range)| {
                    let first_line = range.start + 1;
                    let chunk = &lines[range];
                    scope.spawn(move || self.resolve_partition(index, chunk, first_line))
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(index, handle)| handle.join().map_err(|_| TzError::WorkerPanicked(index)))
                .collect()
        })
    }
}

/// Split `len` items into `workers` contiguous ranges whose sizes differ by at
/// most one. Always returns `workers` ranges (some empty when `len < workers`).
pub fn partition_ranges(len: usize, workers: usize) -> Vec<std::ops::Range<usize>> {
    let workers = workers.max(1);
    let base = len / workers;
    let extra = len % workers;

    let mut start = 0;
    (0..workers)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Write each partition to `<dir>/<prefix><index>`, one line per record.
///
/// # Errors
///
/// `TzError::Io` if a file cannot be created or written.
pub fn write_partitions(dir: &Path, prefix: &str, partitions: &[Partition]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut outputs = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let path = dir.join(format!("{}{}", prefix, partition.index));
        let mut writer = BufWriter::new(File::create(&path)?);
        for line in &partition.lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        log::info!(
            "Task {} done, data dumped in file: {}",
            partition.index,
            path.display()
        );
        outputs.push(path);
    }
    Ok(outputs)
}

/// Read `input`, resolve every unlabelled record and write the output partitions.
///
/// Output goes to `config.output_dir`, or to the directory holding `input`.
///
/// # Errors
///
/// Configuration, I/O and worker failures.
pub fn process_file(input: impl AsRef<Path>, config: Config) -> Result<BatchReport> {
    let input = input.as_ref();
    log::info!("Reading file {}", input.display());
    let lines = read_lines(input)?;

    let resolver = Resolver::from_lines(&lines, config)?;
    let partitions = resolver.resolve_partitioned(&lines)?;

    let dir = match &resolver.config().output_dir {
        Some(dir) => dir.clone(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    log::info!("Output directory {}", dir.display());
    let outputs = write_partitions(&dir, &resolver.config().output_prefix, &partitions)?;

    let mut stats = BatchStats::default();
    for partition in &partitions {
        stats += partition.stats;
    }
    log::info!(
        "DONE: {} lines, {} labelled, {} resolved, {} rejected, {} malformed",
        stats.total,
        stats.labeled,
        stats.resolved,
        stats.rejected,
        stats.malformed
    );

    Ok(BatchReport { outputs, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(lines: &[&str], threshold_km: f64) -> Resolver {
        let config = Config::default()
            .with_threshold_km(threshold_km)
            .with_workers(2);
        Resolver::from_lines(lines, config).unwrap()
    }

    #[test]
    fn test_partition_ranges_cover_everything() {
        assert_eq!(partition_ranges(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(partition_ranges(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
        assert_eq!(partition_ranges(0, 2), vec![0..0, 0..0]);
        assert_eq!(partition_ranges(5, 0), vec![0..5]);

        for (len, workers) in [(101, 8), (7, 7), (1000, 3)] {
            let ranges = partition_ranges(len, workers);
            assert_eq!(ranges.len(), workers);
            assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), len);
            assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
        }
    }

    #[test]
    fn test_reference_excludes_unlabeled_and_malformed() {
        let r = resolver(
            &["52.52,13.405,Europe/Berlin", "50.0,5.0,null", "oops", "48.85,2.35,Europe/Paris"],
            400.0,
        );
        assert_eq!(r.tree().len(), 2);
        assert_eq!(r.malformed_reference(), 1);
    }

    #[test]
    fn test_resolve_line_outcomes() {
        let r = resolver(&["52.52,13.405,Europe/Berlin", "48.85,2.35,Europe/Paris"], 400.0);

        assert_eq!(
            r.resolve_line("1,1,UTC", 1),
            Resolution::Labeled("1,1,UTC".to_string())
        );

        match r.resolve_line("50.0,5.0,null", 2) {
            Resolution::Resolved { line, distance_km } => {
                assert_eq!(line, "50.0,5.0,Europe/Paris");
                assert!(distance_km < 400.0);
            }
            other => panic!("unexpected {other:?}"),
        }

        match r.resolve_line("-33.87,151.21,null", 3) {
            Resolution::Rejected { distance_km } => assert!(distance_km.unwrap() > 400.0),
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(r.resolve_line("x,y,null", 4), Resolution::Malformed);
    }

    #[test]
    fn test_empty_reference_rejects() {
        let r = resolver(&["50.0,5.0,null"], 400.0);
        assert_eq!(
            r.resolve_line("50.0,5.0,null", 1),
            Resolution::Rejected { distance_km: None }
        );
    }

    #[test]
    fn test_great_circle_metric() {
        let config = Config::default()
            .with_threshold_km(1000.0)
            .with_metric(ThresholdMetric::GreatCircle);
        let reference = vec![
            Location::new(48.85, 2.35, "Europe/Paris"),
            Location::unlabeled(0.0, 0.0),
        ];
        let r = Resolver::from_reference(reference, config).unwrap();
        assert_eq!(r.tree().len(), 1);

        match r.resolve_line("52.52,13.405,null", 1) {
            Resolution::Resolved { distance_km, .. } => {
                let berlin = Location::unlabeled(52.52, 13.405);
                let arc = berlin.great_circle_km(&Location::unlabeled(48.85, 2.35));
                assert!((distance_km - arc).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_resolve_partitioned_keeps_order_and_counts() {
        let mut lines = vec![
            "52.52,13.405,Europe/Berlin".to_string(),
            "48.85,2.35,Europe/Paris".to_string(),
        ];
        for i in 0..20 {
            lines.push(format!("{}.0,5.0,null", 45 + i % 5));
        }
        lines.push("-33.87,151.21,null".to_string());

        let r = resolver(&lines.iter().map(String::as_str).collect::<Vec<_>>(), 1000.0);
        let partitions = r.resolve_partitioned(&lines).unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].index, 0);
        assert_eq!(partitions[1].index, 1);

        let mut stats = BatchStats::default();
        for p in &partitions {
            stats += p.stats;
        }
        assert_eq!(stats.total, lines.len());
        assert_eq!(stats.labeled, 2);
        assert_eq!(stats.resolved, 20);
        assert_eq!(stats.rejected, 1);
        assert_eq!(partitions[0].lines[0], "52.52,13.405,Europe/Berlin");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config::default().with_threshold_km(-5.0);
        assert!(matches!(
            Resolver::from_lines(&["1,1,UTC"], config),
            Err(TzError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_write_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let partitions = vec![
            Partition {
                index: 0,
                lines: vec!["a".into(), "b".into()],
                stats: BatchStats::default(),
            },
            Partition {
                index: 1,
                lines: Vec::new(),
                stats: BatchStats::default(),
            },
        ];
        let outputs = write_partitions(dir.path(), "output_", &partitions).unwrap();
        assert_eq!(outputs[0], dir.path().join("output_0"));
        assert_eq!(std::fs::read_to_string(&outputs[0]).unwrap(), "a\nb\n");
        assert_eq!(std::fs::read_to_string(&outputs[1]).unwrap(), "");
    }
}

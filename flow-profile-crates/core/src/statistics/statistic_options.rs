use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::io::stdout;
use std::io::Write;

use convert_case::Case;
use convert_case::Casing;

/// The options for statistic logging containing the statistic prefix, the (optional) line which is
/// printed after the statistics, the (optional) casing of the statistics, and the writer.
pub struct StatisticOptions {
    // What is printed before a statistic is printed, the statistics will be printed in the
    // form `{PREFIX} {NAME}={VALUE}`
    statistic_prefix: String,
    // A closing line which is printed after all of the statistics have been printed
    after_statistics: Option<String>,
    // The casing of the name of the statistic
    statistics_casing: Option<Case>,
    // The writer to which the statistics are written
    statistics_writer: Box<dyn Write>,
}

impl Debug for StatisticOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticOptions")
            .field("statistic_prefix", &self.statistic_prefix)
            .field("after_statistics", &self.after_statistics)
            .field("statistics_casing", &self.statistics_casing)
            .field("statistics_writer", &"<Writer>")
            .finish()
    }
}

impl StatisticOptions {
    /// Creates a sink with the provided prefix and closing line. In case no writer is specified,
    /// stdout will be used.
    pub fn new(
        prefix: impl Into<String>,
        after: Option<String>,
        casing: Option<Case>,
        writer: Option<Box<dyn Write>>,
    ) -> Self {
        StatisticOptions {
            statistic_prefix: prefix.into(),
            after_statistics: after,
            statistics_casing: casing,
            statistics_writer: writer.unwrap_or(Box::new(stdout())),
        }
    }

    /// Logs the provided statistic with name `name` and value `value` in the format
    /// `STATISTIC_PREFIX NAME=VALUE`.
    pub fn write_statistic(&mut self, name: impl Display, value: impl Display) {
        let name = match self.statistics_casing {
            Some(casing) => name.to_string().to_case(casing),
            None => name.to_string(),
        };
        let _ = writeln!(
            self.statistics_writer,
            "{} {name}={value}",
            self.statistic_prefix
        );
    }

    /// Writes the closing line of a block of statistics, if one is configured.
    pub fn write_postfix(&mut self) {
        if let Some(post_fix) = &self.after_statistics {
            let _ = writeln!(self.statistics_writer, "{post_fix}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::statistics::Statistic;
    use crate::statistics::StatisticLogger;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    crate::create_statistics_struct!(TestStatistics {
        num_solves: u64,
        num_augmentations: u64,
    });

    #[test]
    fn statistics_are_written_with_prefix_and_casing() {
        let buffer = SharedBuffer::default();
        let mut options = StatisticOptions::new(
            "%%%mzn-stat:",
            Some("%%%mzn-stat-end".to_owned()),
            Some(Case::Camel),
            Some(Box::new(buffer.clone())),
        );
        let statistics = TestStatistics {
            num_solves: 2,
            num_augmentations: 5,
        };

        statistics.log(StatisticLogger::new("lower", &mut options));
        options.write_postfix();

        assert_eq!(
            buffer.contents(),
            "%%%mzn-stat: lowerNumSolves=2\n%%%mzn-stat: lowerNumAugmentations=5\n%%%mzn-stat-end\n"
        );
    }

    #[test]
    fn names_are_kept_without_casing() {
        let buffer = SharedBuffer::default();
        let mut options = StatisticOptions::new("c STAT", None, None, Some(Box::new(buffer.clone())));

        options.write_statistic("profile_num_builds", 3);
        options.write_postfix();

        assert_eq!(buffer.contents(), "c STAT profile_num_builds=3\n");
    }
}

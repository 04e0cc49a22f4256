use std::fmt::Display;

use super::StatisticOptions;

/// Responsible for logging the statistics with the provided prefix to a borrowed
/// [`StatisticOptions`] sink.
#[derive(Debug)]
pub struct StatisticLogger<'options> {
    /// The prefix which will be attached to the statistic name
    name_prefix: String,
    options: &'options mut StatisticOptions,
}

impl<'options> StatisticLogger<'options> {
    pub fn new(name_prefix: impl Display, options: &'options mut StatisticOptions) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
            options,
        }
    }

    pub fn attach_to_prefix(&mut self, addition_to_prefix: impl Display) -> StatisticLogger<'_> {
        StatisticLogger {
            name_prefix: format!("{}_{}", self.name_prefix, addition_to_prefix),
            options: &mut *self.options,
        }
    }

    /// Writes `value` under the current prefix.
    pub fn log_value(&mut self, value: impl Display) {
        self.options.write_statistic(&self.name_prefix, value);
    }
}

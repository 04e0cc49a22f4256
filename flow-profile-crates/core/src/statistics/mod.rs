//! Contains structures related to the statistic logging of the flow engine.
//!
//! Statistics are never written to process-wide state; the caller owns a [`StatisticOptions`]
//! sink and passes it to the component whose statistics should be written.
mod statistic_logger;
mod statistic_options;

pub use statistic_logger::StatisticLogger;
pub use statistic_options::StatisticOptions;

/// A simple trait for defining a loggable statistic.
///
/// See [`create_statistics_struct!`](crate::create_statistics_struct) for creating a statistic
/// struct automatically!
pub trait Statistic {
    /// Logs the [`Statistic`] using the provided [`StatisticLogger`].
    fn log(&self, statistic_logger: StatisticLogger<'_>);
}

impl<Value: std::fmt::Display> Statistic for Value {
    fn log(&self, mut statistic_logger: StatisticLogger<'_>) {
        statistic_logger.log_value(self);
    }
}

/// A macro for generating a struct for storing statistics.
///
/// # Example
/// ```rust
/// # use flow_profile_core::create_statistics_struct;
/// create_statistics_struct!(Statistics {
///     number_of_calls: usize
/// });
///
/// let statistics = Statistics::default();
///
/// assert_eq!(statistics.number_of_calls, 0);
/// ```
#[macro_export]
macro_rules! create_statistics_struct {
    ($(#[$struct_documentation:meta])* $name:ident { $($(#[$variable_documentation:meta])* $field:ident : $type:ident),+ $(,)? }) => {
        $(#[$struct_documentation])*
        #[derive(Default, Debug, Copy, Clone)]
        pub struct $name {
            $($(#[$variable_documentation])* pub $field: $type),+
        }

        impl $crate::statistics::Statistic for $name {
            fn log(&self, mut statistic_logger: $crate::statistics::StatisticLogger<'_>) {
                $($crate::statistics::Statistic::log(
                    &self.$field,
                    statistic_logger.attach_to_prefix(stringify!($field)),
                );)+
            }
        }
    };
}

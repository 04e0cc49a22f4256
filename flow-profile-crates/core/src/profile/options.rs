/// Configuration of the [`ProfileBuilder`](super::ProfileBuilder).
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileOptions {
    /// Determines whether the flow graphs are updated incrementally or rebuilt on every call
    pub update_strategy: UpdateStrategy,
    /// Determines whether every instant carries the transactions which determine its bounds
    pub explain: bool,
}

impl ProfileOptions {
    pub fn new(update_strategy: UpdateStrategy, explain: bool) -> Self {
        ProfileOptions {
            update_strategy,
            explain,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum UpdateStrategy {
    /// Keep the flow graphs between calls and only touch what changed
    #[default]
    Incremental,
    /// Discard the flow graphs and build them anew on every call
    FromScratch,
}

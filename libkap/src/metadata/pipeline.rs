use std::fmt;

use regex::Regex;
use tracing::trace;

use crate::chart::TextEntry;

type Apply<M> = Box<dyn Fn(M, &[&TextEntry]) -> M + Send + Sync>;

/// Reads one value out of the text entries whose type matches `entry_type`
#[derive(Debug, Clone)]
pub struct Extractor<T> {
    entry_type: Regex,
    read: fn(&[&TextEntry]) -> T,
}

impl<T> Extractor<T> {
    /// Creates a new [`Extractor`]
    #[must_use]
    pub fn new(entry_type: Regex, read: fn(&[&TextEntry]) -> T) -> Self {
        Self { entry_type, read }
    }

    /// Returns the pattern selecting the entries this extractor reads
    #[must_use]
    pub const fn entry_type(&self) -> &Regex {
        &self.entry_type
    }

    /// Runs the extractor on entries that were already selected
    pub fn read(&self, entries: &[&TextEntry]) -> T {
        (self.read)(entries)
    }

    /// Selects the matching entries out of `entries` and runs the extractor on them
    pub fn read_matching(&self, entries: &[TextEntry]) -> T {
        let matched: Vec<_> = select(&self.entry_type, entries).collect();
        self.read(&matched)
    }
}

fn select<'e>(
    entry_type: &'e Regex,
    entries: &'e [TextEntry],
) -> impl Iterator<Item = &'e TextEntry> + 'e {
    entries
        .iter()
        .filter(move |entry| entry_type.is_match(entry.entry_type()))
}

struct Step<M> {
    entry_type: Regex,
    apply: Apply<M>,
}

/// An ordered list of extractors folding their values into a model `M`
///
/// ```rust
/// use libkap::{metadata::{extractors, MetadataPipeline}, TextEntry};
///
/// let pipeline = MetadataPipeline::new()
///     .with_extractor(extractors::name_and_size(), |_: Option<String>, (name, _)| name);
/// let entries = [TextEntry::new("BSB", ["NA=SAANICH INLET,RA=1171,2098"])];
/// assert_eq!(pipeline.run(None, &entries).as_deref(), Some("SAANICH INLET"));
/// ```
pub struct MetadataPipeline<M> {
    steps: Vec<Step<M>>,
}

impl<M> Default for MetadataPipeline<M> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<M> fmt::Debug for MetadataPipeline<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|step| step.entry_type.as_str()))
            .finish()
    }
}

impl<M: 'static> MetadataPipeline<M> {
    /// Creates an empty [`MetadataPipeline`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an extractor; `fold` merges its value into the model
    #[must_use]
    pub fn with_extractor<T: 'static>(mut self, extractor: Extractor<T>, fold: fn(M, T) -> M) -> Self {
        let Extractor { entry_type, read } = extractor;
        self.steps.push(Step {
            entry_type,
            apply: Box::new(move |model: M, entries: &[&TextEntry]| fold(model, read(entries))),
        });
        self
    }

    /// Number of registered extractors
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if no extractor is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every extractor in registration order over `entries`
    pub fn run(&self, mut model: M, entries: &[TextEntry]) -> M {
        for step in &self.steps {
            let matched: Vec<_> = select(&step.entry_type, entries).collect();
            trace!("{} entries match {}", matched.len(), step.entry_type);
            model = (step.apply)(model, &matched);
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(entries: &[&TextEntry]) -> usize {
        entries.len()
    }

    fn first_line(entries: &[&TextEntry]) -> Option<String> {
        entries
            .first()
            .and_then(|entry| entry.lines().first())
            .cloned()
    }

    #[test]
    fn folds_in_registration_order() {
        let entries = [
            TextEntry::new("K01", ["NA=A"]),
            TextEntry::new("K02", ["NA=B"]),
            TextEntry::new("BSB", ["NA=C"]),
        ];
        let pipeline = MetadataPipeline::new()
            .with_extractor(
                Extractor::new(Regex::new(r"^K\d{2}$").unwrap(), count),
                |mut log: Vec<String>, n| {
                    log.push(format!("panels:{n}"));
                    log
                },
            )
            .with_extractor(
                Extractor::new(Regex::new("^BSB$").unwrap(), first_line),
                |mut log: Vec<String>, line| {
                    log.push(format!("bsb:{}", line.unwrap_or_default()));
                    log
                },
            );
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.run(Vec::new(), &entries), ["panels:2", "bsb:NA=C"]);
    }

    #[test]
    fn unmatched_pattern_sees_no_entries() {
        let entries = [TextEntry::new("RGB", ["1,0,0,0"])];
        let extractor = Extractor::new(Regex::new("^PLY$").unwrap(), count);
        assert_eq!(extractor.read_matching(&entries), 0);
    }

    #[test]
    fn patterns_are_unanchored_unless_asked() {
        let entries = [TextEntry::new("KNP", ["SC=1"]), TextEntry::new("KNQ", ["EC=1"])];
        let extractor = Extractor::new(Regex::new("KN").unwrap(), count);
        assert_eq!(extractor.read_matching(&entries), 2);
    }
}

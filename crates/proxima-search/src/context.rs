use proxima_core::models::{AddressRecord, ProximityOptions, SubfieldFilter, SubfieldOption};

/// State of a single proximity search, threaded from the builder through
/// target resolution and the subfield fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchContext {
    /// Effective subfield option; starts as the caller's and may be
    /// replaced by a fallback filter
    subfields: Option<SubfieldOption>,

    /// Normalized first geocoding candidate, if a lookup happened
    candidate: Option<AddressRecord>,
}

impl SearchContext {
    pub fn new(options: &ProximityOptions) -> Self {
        Self {
            subfields: options.subfields.clone(),
            candidate: None,
        }
    }

    /// Whether the caller asked for the subfield fallback and no filter
    /// has been derived yet
    pub fn is_fallback(&self) -> bool {
        self.subfields.as_ref().is_some_and(SubfieldOption::is_fallback)
    }

    /// The subfield filter to apply, if any
    pub fn subfield_filter(&self) -> Option<&SubfieldFilter> {
        self.subfields.as_ref().and_then(SubfieldOption::filter)
    }

    /// Replace the effective subfield option with a derived filter.
    ///
    /// Empty filters are ignored.
    pub fn replace_subfields(&mut self, filter: SubfieldFilter) {
        if !filter.is_empty() {
            self.subfields = Some(SubfieldOption::Filter(filter));
        }
    }

    pub fn set_candidate(&mut self, candidate: AddressRecord) {
        self.candidate = Some(candidate);
    }

    pub fn candidate(&self) -> Option<&AddressRecord> {
        self.candidate.as_ref()
    }

    pub fn take_candidate(&mut self) -> Option<AddressRecord> {
        self.candidate.take()
    }
}

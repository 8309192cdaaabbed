/// Classified purpose of a user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    JobSearch,
    GeneralQuery,
}

const JOB_NOUNS: &[&str] = &["job", "jobs", "openings", "opportunity", "vacancy"];

const ACTION_VERBS: &[&str] = &["find", "search", "looking", "get", "apply"];

/// Classifies an utterance as a job-search request or a general query.
///
/// This is a deliberate conjunctive keyword heuristic, not a learned
/// classifier: JobSearch iff the lowercased utterance contains at least one
/// job noun AND at least one action verb (substring match). False negatives
/// are an accepted precision tradeoff; do not widen the vocabularies without
/// revisiting that tradeoff.
pub fn classify(utterance: &str) -> Intent {
    let lower = utterance.to_lowercase();
    let has_job_noun = JOB_NOUNS.iter().any(|kw| lower.contains(kw));
    let has_action_verb = ACTION_VERBS.iter().any(|kw| lower.contains(kw));

    if has_job_noun && has_action_verb {
        Intent::JobSearch
    } else {
        Intent::GeneralQuery
    }
}

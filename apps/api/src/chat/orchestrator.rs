use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::chat::intent::{self, Intent};
use crate::chat::prompts;
use crate::chat::store::{Conversation, Turn};
use crate::clients::jobs::{DEFAULT_LOCATION, MAX_RESULTS};
use crate::clients::{JobPosting, JobSearcher, TextGenerator};
use crate::extract::{self, ResumeDocument};

/// Fixed reply when the listings provider returns zero postings.
pub const NO_JOBS_MESSAGE: &str = "No jobs found for this query.";

/// The user-utterance text, tagged by source. Typed and voice-transcribed
/// input are equivalent once resolved; typed wins when both are present.
#[derive(Debug, Clone)]
pub enum UserText {
    Typed(String),
    Transcribed(String),
}

impl UserText {
    /// Resolves the two input modalities into one canonical utterance.
    /// Blank strings count as absent.
    pub fn resolve(typed: Option<String>, transcript: Option<String>) -> Option<UserText> {
        let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        if let Some(text) = non_blank(typed) {
            return Some(UserText::Typed(text));
        }
        non_blank(transcript).map(UserText::Transcribed)
    }

    pub fn into_text(self) -> String {
        match self {
            UserText::Typed(s) | UserText::Transcribed(s) => s,
        }
    }
}

/// One user submission: text and/or an uploaded document.
#[derive(Debug, Default)]
pub struct Submission {
    pub utterance: Option<UserText>,
    pub document: Option<ResumeDocument>,
}

impl Submission {
    pub fn is_empty(&self) -> bool {
        self.utterance.is_none() && self.document.is_none()
    }
}

/// What one turn produced. `analysis` and `reply` were appended to history;
/// `analysis_error` was not, so resubmitting the document retries cleanly.
#[derive(Debug, Default, Serialize)]
pub struct TurnOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

/// Top-level per-turn coordinator. Stateless itself; all session state lives
/// in the `Conversation` passed in, so one orchestrator serves every session.
pub struct Orchestrator {
    llm: Arc<dyn TextGenerator>,
    jobs: Arc<dyn JobSearcher>,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn TextGenerator>, jobs: Arc<dyn JobSearcher>) -> Self {
        Self { llm, jobs }
    }

    /// Runs the document-analysis and conversational actions for one
    /// submission. Every downstream failure becomes user-visible text in the
    /// outcome; nothing propagates.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        submission: Submission,
    ) -> TurnOutcome {
        let mut outcome = TurnOutcome::default();

        if let Some(document) = &submission.document {
            self.analyze_document(conversation, document, &mut outcome)
                .await;
        }

        if let Some(utterance) = submission.utterance {
            self.converse(conversation, &utterance.into_text(), &mut outcome)
                .await;
        }

        outcome
    }

    /// Document-analysis action. Extraction or generation failure is terminal
    /// for this action only: it is reported in the outcome but appends no
    /// assistant turn, keeping history clean for a retry.
    async fn analyze_document(
        &self,
        conversation: &mut Conversation,
        document: &ResumeDocument,
        outcome: &mut TurnOutcome,
    ) {
        let resume_text = match extract::extract(document) {
            Ok(text) => text,
            Err(e) => {
                warn!("Resume extraction failed: {e}");
                outcome.analysis_error = Some(e.to_string());
                return;
            }
        };

        info!("Resume extracted ({} chars), analyzing", resume_text.len());

        match self.llm.generate(&prompts::analysis_prompt(&resume_text)).await {
            Ok(analysis) => {
                conversation.append(Turn::assistant(analysis.clone()));
                outcome.analysis = Some(analysis);
            }
            Err(e) => {
                warn!("Resume analysis failed: {e}");
                outcome.analysis_error = Some(format!("Resume analysis failed: {e}"));
            }
        }
    }

    /// Conversational action. The user turn is appended first, always, so the
    /// log reflects what was asked even when the response fails; exactly one
    /// assistant turn follows, carrying either the reply or the error text.
    async fn converse(&self, conversation: &mut Conversation, text: &str, outcome: &mut TurnOutcome) {
        conversation.append(Turn::user(text));

        let reply = match intent::classify(text) {
            Intent::JobSearch => self.job_search_reply(text).await,
            Intent::GeneralQuery => {
                let prompt = prompts::conversation_prompt(&conversation.render());
                match self.llm.generate(&prompt).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("Generation failed: {e}");
                        format!("Error: {e}")
                    }
                }
            }
        };

        conversation.append(Turn::assistant(reply.clone()));
        outcome.reply = Some(reply);
    }

    async fn job_search_reply(&self, query: &str) -> String {
        match self.jobs.search(query, DEFAULT_LOCATION).await {
            Ok(postings) if postings.is_empty() => NO_JOBS_MESSAGE.to_string(),
            Ok(postings) => format_postings(&postings),
            Err(e) => {
                warn!("Job search failed: {e}");
                format!("Failed to fetch jobs: {e}")
            }
        }
    }
}

/// Formats up to [`MAX_RESULTS`] postings into one reply, in provider order.
fn format_postings(postings: &[JobPosting]) -> String {
    let entries = postings
        .iter()
        .take(MAX_RESULTS)
        .map(|p| {
            format!(
                "**{}** at {}\n{}, {}\nApply: {}",
                p.title, p.employer, p.city, p.country, p.apply_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Here are some job openings:\n\n{entries}")
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::chat::store::Role;
    use crate::clients::ServiceError;
    use crate::extract::{DOCX_MIME, PDF_MIME};

    struct FakeLlm {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeLlm {
        fn ok() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeLlm {
        async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(ServiceError::Status {
                    status: 503,
                    message: "backend unavailable".to_string(),
                })
            } else {
                Ok("generated reply".to_string())
            }
        }
    }

    struct FakeJobs {
        calls: Mutex<Vec<(String, String)>>,
        result: Result<Vec<JobPosting>, ()>,
    }

    impl FakeJobs {
        fn with_postings(count: usize) -> Self {
            let postings = (1..=count)
                .map(|i| JobPosting {
                    title: format!("Job {i}"),
                    employer: "Acme".to_string(),
                    city: "Pune".to_string(),
                    country: "IN".to_string(),
                    apply_url: format!("https://example.com/{i}"),
                })
                .collect();
            Self {
                calls: Mutex::new(Vec::new()),
                result: Ok(postings),
            }
        }

        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result: Err(()),
            }
        }
    }

    #[async_trait]
    impl JobSearcher for FakeJobs {
        async fn search(
            &self,
            query: &str,
            location: &str,
        ) -> Result<Vec<JobPosting>, ServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), location.to_string()));
            match &self.result {
                Ok(postings) => Ok(postings.clone()),
                Err(()) => Err(ServiceError::Status {
                    status: 500,
                    message: "listings provider down".to_string(),
                }),
            }
        }
    }

    fn orchestrator(llm: Arc<FakeLlm>, jobs: Arc<FakeJobs>) -> Orchestrator {
        Orchestrator::new(llm, jobs)
    }

    fn typed(text: &str) -> Submission {
        Submission {
            utterance: UserText::resolve(Some(text.to_string()), None),
            document: None,
        }
    }

    /// Minimal DOCX container with the given paragraphs.
    fn docx_document(paragraphs: &[&str]) -> ResumeDocument {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        ResumeDocument {
            media_type: DOCX_MIME.to_string(),
            bytes: Bytes::from(writer.finish().unwrap().into_inner()),
        }
    }

    #[test]
    fn test_typed_text_takes_precedence_over_transcript() {
        let resolved = UserText::resolve(
            Some("typed".to_string()),
            Some("transcribed".to_string()),
        )
        .unwrap();
        assert_eq!(resolved.into_text(), "typed");

        let resolved = UserText::resolve(Some("   ".to_string()), Some("spoken".to_string()));
        assert_eq!(resolved.unwrap().into_text(), "spoken");

        assert!(UserText::resolve(None, None).is_none());
    }

    #[test]
    fn test_submission_with_no_text_and_no_document_is_empty() {
        assert!(Submission::default().is_empty());

        // Blank inputs resolve to absent text, so the submission stays empty
        let submission = Submission {
            utterance: UserText::resolve(Some("  ".to_string()), Some(String::new())),
            document: None,
        };
        assert!(submission.is_empty());

        assert!(!typed("hello").is_empty());
        let submission = Submission {
            utterance: None,
            document: Some(docx_document(&["Jane Doe"])),
        };
        assert!(!submission.is_empty());
    }

    #[tokio::test]
    async fn test_empty_submission_runs_no_action() {
        // The HTTP boundary rejects empty submissions before run_turn; even
        // if one slipped through, no action fires and no turn is appended.
        let llm = Arc::new(FakeLlm::ok());
        let jobs = Arc::new(FakeJobs::with_postings(3));
        let orch = orchestrator(llm.clone(), jobs.clone());
        let mut conversation = Conversation::default();

        let outcome = orch.run_turn(&mut conversation, Submission::default()).await;

        assert!(outcome.analysis.is_none());
        assert!(outcome.analysis_error.is_none());
        assert!(outcome.reply.is_none());
        assert!(llm.calls().is_empty());
        assert!(jobs.calls.lock().unwrap().is_empty());
        assert!(conversation.turns().is_empty());
    }

    #[tokio::test]
    async fn test_job_search_turn_forwards_query_with_default_location() {
        let llm = Arc::new(FakeLlm::ok());
        let jobs = Arc::new(FakeJobs::with_postings(3));
        let orch = orchestrator(llm.clone(), jobs.clone());
        let mut conversation = Conversation::default();

        let outcome = orch
            .run_turn(&mut conversation, typed("Find jobs for data analyst"))
            .await;

        let calls = jobs.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("Find jobs for data analyst".to_string(), "India".to_string())]
        );
        assert!(llm.calls().is_empty(), "job search must not call the LLM");

        let reply = outcome.reply.unwrap();
        assert!(reply.contains("Job 1"));
        assert!(reply.contains("Job 3"));
        assert_eq!(conversation.turns().len(), 2);
        assert_eq!(conversation.turns()[1].role, Role::Assistant);
        assert_eq!(conversation.turns()[1].content, reply);
    }

    #[tokio::test]
    async fn test_job_reply_contains_at_most_five_postings() {
        let orch = orchestrator(
            Arc::new(FakeLlm::ok()),
            Arc::new(FakeJobs::with_postings(7)),
        );
        let mut conversation = Conversation::default();

        let outcome = orch.run_turn(&mut conversation, typed("find me jobs")).await;

        let reply = outcome.reply.unwrap();
        assert!(reply.contains("Job 5"));
        assert!(!reply.contains("Job 6"));
        assert!(!reply.contains("Job 7"));
    }

    #[tokio::test]
    async fn test_zero_postings_yields_fixed_no_jobs_message() {
        let orch = orchestrator(
            Arc::new(FakeLlm::ok()),
            Arc::new(FakeJobs::with_postings(0)),
        );
        let mut conversation = Conversation::default();

        let outcome = orch.run_turn(&mut conversation, typed("find me jobs")).await;

        assert_eq!(outcome.reply.as_deref(), Some(NO_JOBS_MESSAGE));
    }

    #[tokio::test]
    async fn test_job_search_failure_becomes_reply_text() {
        let orch = orchestrator(Arc::new(FakeLlm::ok()), Arc::new(FakeJobs::failing()));
        let mut conversation = Conversation::default();

        let outcome = orch.run_turn(&mut conversation, typed("find me jobs")).await;

        let reply = outcome.reply.unwrap();
        assert!(reply.starts_with("Failed to fetch jobs:"));
        // The failure is a logged reply, not a dropped turn
        assert_eq!(conversation.turns().len(), 2);
    }

    #[tokio::test]
    async fn test_general_query_builds_domain_prompt_from_history() {
        let llm = Arc::new(FakeLlm::ok());
        let orch = orchestrator(llm.clone(), Arc::new(FakeJobs::with_postings(0)));
        let mut conversation = Conversation::default();

        let question = "What skills do I need for data science?";
        let outcome = orch.run_turn(&mut conversation, typed(question)).await;

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            format!("{}\n\nUser: {question}", prompts::DOMAIN_PROMPT)
        );

        assert_eq!(outcome.reply.as_deref(), Some("generated reply"));
        assert_eq!(conversation.turns()[0].role, Role::User);
        assert_eq!(conversation.turns()[1].content, "generated reply");
    }

    #[tokio::test]
    async fn test_generation_failure_is_appended_as_error_reply() {
        let orch = orchestrator(
            Arc::new(FakeLlm::failing()),
            Arc::new(FakeJobs::with_postings(0)),
        );
        let mut conversation = Conversation::default();

        let outcome = orch
            .run_turn(&mut conversation, typed("How do I switch careers?"))
            .await;

        let reply = outcome.reply.unwrap();
        assert!(reply.starts_with("Error:"));
        assert!(reply.contains("backend unavailable"));
        // Both the user turn and the error reply are in history
        assert_eq!(conversation.turns().len(), 2);
        assert_eq!(conversation.turns()[1].content, reply);
    }

    #[tokio::test]
    async fn test_resume_analysis_appends_assistant_turn() {
        let llm = Arc::new(FakeLlm::ok());
        let orch = orchestrator(llm.clone(), Arc::new(FakeJobs::with_postings(0)));
        let mut conversation = Conversation::default();

        let submission = Submission {
            utterance: None,
            document: Some(docx_document(&["Jane Doe", "Data Analyst"])),
        };
        let outcome = orch.run_turn(&mut conversation, submission).await;

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("Jane Doe\nData Analyst"));

        assert_eq!(outcome.analysis.as_deref(), Some("generated reply"));
        assert!(outcome.analysis_error.is_none());
        assert_eq!(conversation.turns().len(), 1);
        assert_eq!(conversation.turns()[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_empty_document_fails_without_llm_call_or_turn() {
        let llm = Arc::new(FakeLlm::ok());
        let orch = orchestrator(llm.clone(), Arc::new(FakeJobs::with_postings(0)));
        let mut conversation = Conversation::default();

        let submission = Submission {
            utterance: None,
            document: Some(docx_document(&["   ", ""])),
        };
        let outcome = orch.run_turn(&mut conversation, submission).await;

        assert_eq!(
            outcome.analysis_error.as_deref(),
            Some("no text found in document")
        );
        assert!(llm.calls().is_empty());
        assert!(conversation.turns().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_reported_not_raised() {
        let orch = orchestrator(
            Arc::new(FakeLlm::ok()),
            Arc::new(FakeJobs::with_postings(0)),
        );
        let mut conversation = Conversation::default();

        let submission = Submission {
            utterance: None,
            document: Some(ResumeDocument {
                media_type: "image/png".to_string(),
                bytes: Bytes::from_static(b"\x89PNG"),
            }),
        };
        let outcome = orch.run_turn(&mut conversation, submission).await;

        assert_eq!(
            outcome.analysis_error.as_deref(),
            Some("unsupported file type: image/png")
        );
        assert!(conversation.turns().is_empty());
    }

    #[tokio::test]
    async fn test_document_and_text_in_one_submission_run_both_actions() {
        let llm = Arc::new(FakeLlm::ok());
        let orch = orchestrator(llm.clone(), Arc::new(FakeJobs::with_postings(0)));
        let mut conversation = Conversation::default();

        let submission = Submission {
            utterance: UserText::resolve(None, Some("What roles suit me?".to_string())),
            document: Some(docx_document(&["Jane Doe"])),
        };
        let outcome = orch.run_turn(&mut conversation, submission).await;

        assert!(outcome.analysis.is_some());
        assert!(outcome.reply.is_some());
        // analysis turn + user turn + reply turn
        assert_eq!(conversation.turns().len(), 3);
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_analysis_service_error_leaves_history_retry_clean() {
        let orch = orchestrator(
            Arc::new(FakeLlm::failing()),
            Arc::new(FakeJobs::with_postings(0)),
        );
        let mut conversation = Conversation::default();

        let submission = Submission {
            utterance: None,
            document: Some(docx_document(&["Jane Doe"])),
        };
        let outcome = orch.run_turn(&mut conversation, submission).await;

        assert!(outcome.analysis.is_none());
        let err = outcome.analysis_error.unwrap();
        assert!(err.starts_with("Resume analysis failed:"));
        assert!(conversation.turns().is_empty());
    }

    #[test]
    fn test_pdf_mime_is_accepted_by_the_extraction_gate() {
        // Keeps the PDF arm of the submission path honest without needing a
        // real PDF fixture: garbage bytes must come back contained.
        let document = ResumeDocument {
            media_type: PDF_MIME.to_string(),
            bytes: Bytes::from_static(b"%PDF-bogus"),
        };
        assert!(extract::extract(&document).is_err());
    }
}

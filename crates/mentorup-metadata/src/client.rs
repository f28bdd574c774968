//! GraphQL metadata client (spec §4.3).
//!
//! Grounded on `mentor_upload_api/api.py`'s request-building pattern: POST a
//! `{query, variables}` body, `raise_for_status`, then treat a top-level
//! `errors` field in the JSON response as a failure even on a 2xx status.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use mentorup_models::{
    AnswerMedia, AnswerPatch, ImportTask, PendingAnswerTransfer, TaskEntry, TaskPatch, UploadTask,
};

use crate::error::{MetadataError, MetadataResult};
use crate::retry::{with_retry, RetryConfig};

/// Configuration for the metadata client, sourced from spec §6's
/// `GRAPHQL_ENDPOINT`/`API_SECRET` env vars.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub endpoint: String,
    pub api_secret: String,
    pub timeout: Duration,
}

impl MetadataConfig {
    pub fn from_env() -> MetadataResult<Self> {
        let endpoint = std::env::var("GRAPHQL_ENDPOINT")
            .map_err(|_| MetadataError::InvalidResponse("GRAPHQL_ENDPOINT not set".into()))?;
        let api_secret = std::env::var("API_SECRET")
            .map_err(|_| MetadataError::InvalidResponse("API_SECRET not set".into()))?;
        let timeout_secs: u64 = std::env::var("METADATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);

        Ok(Self {
            endpoint,
            api_secret,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// GraphQL client for the mentor/question/answer metadata service (spec §4.3).
#[derive(Clone)]
pub struct MetadataClient {
    http: Client,
    config: MetadataConfig,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: String,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl MetadataClient {
    pub fn new(config: MetadataConfig) -> MetadataResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MetadataError::Network)?;
        Ok(Self {
            http,
            config,
            retry: RetryConfig::default(),
        })
    }

    pub fn from_env() -> MetadataResult<Self> {
        Self::new(MetadataConfig::from_env()?)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> MetadataResult<T> {
        let body = GraphQlRequest {
            query: query.to_string(),
            variables,
        };

        with_retry(&self.retry, operation, || async {
            let response = self
                .http
                .post(&self.config.endpoint)
                .bearer_auth(&self.config.api_secret)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;

            if !status.is_success() {
                return Err(MetadataError::Http {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let parsed: GraphQlResponse<T> = serde_json::from_str(&text)?;

            if let Some(errors) = parsed.errors {
                if !errors.is_empty() {
                    let joined = errors
                        .into_iter()
                        .map(|e| e.message)
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(MetadataError::GraphQl(joined));
                }
            }

            parsed
                .data
                .ok_or_else(|| MetadataError::InvalidResponse("missing data field".into()))
        })
        .await
    }

    /// Patches exactly one `TaskEntry` by `task_id` (spec §4.3).
    pub async fn upload_task_status_update(
        &self,
        mentor: &str,
        question: &str,
        patch: TaskPatch,
    ) -> MetadataResult<()> {
        #[derive(Deserialize)]
        struct Resp {
            #[allow(dead_code)]
            ok: bool,
        }
        self.execute::<Resp>(
            "upload_task_status_update",
            r#"mutation UploadTaskStatusUpdate($mentor: ID!, $question: ID!, $patch: TaskPatchInput!) {
                uploadTaskStatusUpdate(mentor: $mentor, question: $question, patch: $patch) { ok }
            }"#,
            json!({ "mentor": mentor, "question": question, "patch": patch }),
        )
        .await?;
        Ok(())
    }

    /// Installs a brand-new `task_list` (every `TaskEntry` the dispatcher just
    /// minted) alongside an `AnswerPatch`, in one call. Grounded on
    /// `api.py`'s `UploadTaskRequest`/`upload_task_update`, which always
    /// carries the full `{transcodeWebTask, transcodeMobileTask,
    /// trimUploadTask, transcribeTask}` status object rather than one entry
    /// at a time (spec §4.4 step 7, §4.5 `trim-upload`).
    pub async fn upload_task_create(
        &self,
        mentor: &str,
        question: &str,
        answer_patch: AnswerPatch,
        task_list: Vec<TaskEntry>,
    ) -> MetadataResult<()> {
        #[derive(Deserialize)]
        struct Resp {
            #[allow(dead_code)]
            ok: bool,
        }
        self.execute::<Resp>(
            "upload_task_create",
            r#"mutation UploadTaskCreate($mentor: ID!, $question: ID!, $answerPatch: AnswerPatchInput!, $taskList: [TaskEntryInput!]!) {
                uploadTaskCreate(mentor: $mentor, question: $question, answerPatch: $answerPatch, taskList: $taskList) { ok }
            }"#,
            json!({
                "mentor": mentor,
                "question": question,
                "answerPatch": answer_patch,
                "taskList": task_list,
            }),
        )
        .await?;
        Ok(())
    }

    /// Atomic combined update of the Answer and one TaskEntry (spec §4.3).
    pub async fn upload_answer_and_task_update(
        &self,
        mentor: &str,
        question: &str,
        answer_patch: AnswerPatch,
        task_patch: TaskPatch,
    ) -> MetadataResult<()> {
        #[derive(Deserialize)]
        struct Resp {
            #[allow(dead_code)]
            ok: bool,
        }
        self.execute::<Resp>(
            "upload_answer_and_task_update",
            r#"mutation UploadAnswerAndTaskUpdate($mentor: ID!, $question: ID!, $answerPatch: AnswerPatchInput!, $taskPatch: TaskPatchInput!) {
                uploadAnswerAndTaskUpdate(mentor: $mentor, question: $question, answerPatch: $answerPatch, taskPatch: $taskPatch) { ok }
            }"#,
            json!({
                "mentor": mentor,
                "question": question,
                "answerPatch": answer_patch,
                "taskPatch": task_patch,
            }),
        )
        .await?;
        Ok(())
    }

    /// Returns the current `UploadTask`, or `None` if no task document exists.
    pub async fn fetch_task(&self, mentor: &str, question: &str) -> MetadataResult<Option<UploadTask>> {
        #[derive(Deserialize)]
        struct Resp {
            task: Option<UploadTask>,
        }
        let resp: Resp = self
            .execute(
                "fetch_task",
                r#"query FetchTask($mentor: ID!, $question: ID!) {
                    task(mentor: $mentor, question: $question) {
                        mentorId questionId taskList { taskName taskId status } transcript media { type tag url needsTransfer }
                    }
                }"#,
                json!({ "mentor": mentor, "question": question }),
            )
            .await?;
        Ok(resp.task)
    }

    /// Derived predicate: true iff a task document exists (spec §4.3, §4.4 step 1).
    pub async fn is_upload_in_progress(&self, mentor: &str, question: &str) -> MetadataResult<bool> {
        Ok(self.fetch_task(mentor, question).await?.is_some())
    }

    /// Returns `(transcript, media, has_edited_transcript)` for an answer.
    pub async fn fetch_answer_transcript_and_media(
        &self,
        mentor: &str,
        question: &str,
    ) -> MetadataResult<(String, Vec<AnswerMedia>, bool)> {
        #[derive(Deserialize)]
        struct Resp {
            answer: AnswerSnapshot,
        }
        #[derive(Deserialize)]
        struct AnswerSnapshot {
            transcript: String,
            media: Vec<AnswerMedia>,
            has_edited_transcript: bool,
        }
        let resp: Resp = self
            .execute(
                "fetch_answer_transcript_and_media",
                r#"query FetchAnswerTranscriptAndMedia($mentor: ID!, $question: ID!) {
                    answer(mentor: $mentor, question: $question) {
                        transcript hasEditedTranscript media { type tag url needsTransfer }
                    }
                }"#,
                json!({ "mentor": mentor, "question": question }),
            )
            .await?;
        Ok((resp.answer.transcript, resp.answer.media, resp.answer.has_edited_transcript))
    }

    /// Patches a subset of media roles on an Answer (spec §4.3).
    pub async fn media_update(
        &self,
        mentor: &str,
        question: &str,
        media: Vec<AnswerMedia>,
    ) -> MetadataResult<()> {
        #[derive(Deserialize)]
        struct Resp {
            #[allow(dead_code)]
            ok: bool,
        }
        self.execute::<Resp>(
            "media_update",
            r#"mutation MediaUpdate($mentor: ID!, $question: ID!, $media: [AnswerMediaInput!]!) {
                mediaUpdate(mentor: $mentor, question: $question, media: $media) { ok }
            }"#,
            json!({ "mentor": mentor, "question": question, "media": media }),
        )
        .await?;
        Ok(())
    }

    /// Resolves a question id to its name, used to recognize the `"_IDLE_"`
    /// sentinel (spec §4.3, §4.5).
    pub async fn fetch_question_name(&self, question: &str) -> MetadataResult<String> {
        #[derive(Deserialize)]
        struct Resp {
            question: QuestionSnapshot,
        }
        #[derive(Deserialize)]
        struct QuestionSnapshot {
            name: String,
        }
        let resp: Resp = self
            .execute(
                "fetch_question_name",
                r#"query FetchQuestionName($question: ID!) { question(id: $question) { name } }"#,
                json!({ "question": question }),
            )
            .await?;
        Ok(resp.question.name)
    }

    /// Creates the `ImportTask` aggregate (spec §4.7).
    pub async fn import_task_create(&self, mentor_id: &str) -> MetadataResult<ImportTask> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(rename = "importTaskCreate")]
            import_task_create: ImportTask,
        }
        let resp: Resp = self
            .execute(
                "import_task_create",
                r#"mutation ImportTaskCreate($mentorId: ID!) {
                    importTaskCreate(mentorId: $mentorId) {
                        mentorId graphqlUpdate s3VideoMigration perAnswer { questionId status errorMessage }
                    }
                }"#,
                json!({ "mentorId": mentor_id }),
            )
            .await?;
        Ok(resp.import_task_create)
    }

    /// Patches the `ImportTask` aggregate (spec §4.7).
    pub async fn import_task_update(&self, task: &ImportTask) -> MetadataResult<()> {
        #[derive(Deserialize)]
        struct Resp {
            #[allow(dead_code)]
            ok: bool,
        }
        self.execute::<Resp>(
            "import_task_update",
            r#"mutation ImportTaskUpdate($task: ImportTaskInput!) {
                importTaskUpdate(task: $task) { ok }
            }"#,
            json!({ "task": task }),
        )
        .await?;
        Ok(())
    }

    /// Applies `changes` to `mentor`'s GraphQL record from `export`, returning
    /// the per-question answers that now need their media transferred into
    /// owned storage (spec §4.7).
    pub async fn mentor_import(
        &self,
        mentor: &str,
        export: Value,
        changes: Value,
    ) -> MetadataResult<Vec<PendingAnswerTransfer>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(rename = "mentorImport")]
            mentor_import: MentorImportResult,
        }
        #[derive(Deserialize)]
        struct MentorImportResult {
            #[serde(rename = "pendingAnswers")]
            pending_answers: Vec<PendingAnswerTransfer>,
        }
        let resp: Resp = self
            .execute(
                "mentor_import",
                r#"mutation MentorImport($mentor: ID!, $export: JSON!, $changes: JSON!) {
                    mentorImport(mentor: $mentor, export: $export, changes: $changes) {
                        pendingAnswers { questionId media { type tag url needsTransfer } }
                    }
                }"#,
                json!({ "mentor": mentor, "export": export, "changes": changes }),
            )
            .await?;
        Ok(resp.mentor_import.pending_answers)
    }

    /// `mentorThumbnailUpdate` — used by the thumbnail upload handler.
    pub async fn mentor_thumbnail_update(&self, mentor: &str, url: &str) -> MetadataResult<()> {
        #[derive(Deserialize)]
        struct Resp {
            #[allow(dead_code)]
            ok: bool,
        }
        self.execute::<Resp>(
            "mentor_thumbnail_update",
            r#"mutation MentorThumbnailUpdate($mentor: ID!, $thumbnail: String!) {
                mentorThumbnailUpdate(mentor: $mentor, thumbnail: $thumbnail) { ok }
            }"#,
            json!({ "mentor": mentor, "thumbnail": url }),
        )
        .await?;
        Ok(())
    }
}

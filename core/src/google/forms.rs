//! Google Forms API v1 Client

use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::{extract_array, segment};

const FORMS_API_BASE: &str = "https://forms.googleapis.com/v1";

/// Question kinds accepted by `forms_add_question`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    ShortAnswer,
    Paragraph,
    MultipleChoice,
    Checkbox,
    DropDown,
}

impl QuestionKind {
    pub const NAMES: [&'static str; 5] = [
        "SHORT_ANSWER",
        "PARAGRAPH",
        "MULTIPLE_CHOICE",
        "CHECKBOX",
        "DROP_DOWN",
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "SHORT_ANSWER" => Some(Self::ShortAnswer),
            "PARAGRAPH" => Some(Self::Paragraph),
            "MULTIPLE_CHOICE" => Some(Self::MultipleChoice),
            "CHECKBOX" => Some(Self::Checkbox),
            "DROP_DOWN" => Some(Self::DropDown),
            _ => None,
        }
    }

    pub fn needs_choices(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::Checkbox | Self::DropDown)
    }

    /// The `question` object of a Forms item, or `None` for a choice kind
    /// given no options.
    pub fn question_body(self, required: bool, choices: &[String]) -> Option<Value> {
        let mut question = json!({ "required": required });
        match self {
            Self::ShortAnswer => question["textQuestion"] = json!({ "paragraph": false }),
            Self::Paragraph => question["textQuestion"] = json!({ "paragraph": true }),
            Self::MultipleChoice | Self::Checkbox | Self::DropDown => {
                if choices.is_empty() {
                    return None;
                }
                let kind = match self {
                    Self::MultipleChoice => "RADIO",
                    Self::Checkbox => "CHECKBOX",
                    _ => "DROP_DOWN",
                };
                let options: Vec<Value> = choices.iter().map(|c| json!({ "value": c })).collect();
                question["choiceQuestion"] = json!({ "type": kind, "options": options });
            }
        }
        Some(question)
    }
}

pub struct FormsApi {
    client: GoogleClient,
}

super::google_api_wrapper!(FormsApi, FORMS_API_BASE);

impl FormsApi {
    /// Create a form. The API only accepts `info.title` and `info.documentTitle`
    /// on creation.
    pub async fn create_form(
        &self,
        title: &str,
        document_title: Option<&str>,
    ) -> Result<Value, GoogleError> {
        info!("Creating form: {}", title);

        let mut body = json!({ "info": { "title": title } });
        if let Some(doc_title) = document_title {
            body["info"]["documentTitle"] = json!(doc_title);
        }
        self.client.post("/forms", &[], &body).await
    }

    pub async fn get_form(&self, form_id: &str) -> Result<Value, GoogleError> {
        info!("Fetching form: {}", form_id);
        self.client.get(&format!("/forms/{}", segment(form_id)), &[]).await
    }

    /// Insert one question item at `index`
    pub async fn create_item(
        &self,
        form_id: &str,
        title: &str,
        question: Value,
        index: u32,
    ) -> Result<Value, GoogleError> {
        info!("Adding question to form {}", form_id);

        let body = json!({
            "requests": [{
                "createItem": {
                    "item": {
                        "title": title,
                        "questionItem": { "question": question },
                    },
                    "location": { "index": index },
                }
            }]
        });
        let path = format!("/forms/{}:batchUpdate", segment(form_id));
        self.client.post(&path, &[], &body).await
    }

    /// List responses (first page)
    pub async fn list_responses(&self, form_id: &str) -> Result<Vec<Value>, GoogleError> {
        info!("Listing responses for form {}", form_id);

        let path = format!("/forms/{}/responses", segment(form_id));
        let response = self.client.get(&path, &[]).await?;
        let responses = extract_array(&response, "responses");

        debug!("Retrieved {} responses", responses.len());
        Ok(responses)
    }

    pub async fn get_response(&self, form_id: &str, response_id: &str) -> Result<Value, GoogleError> {
        info!("Fetching response {} of form {}", response_id, form_id);

        let path = format!(
            "/forms/{}/responses/{}",
            segment(form_id),
            segment(response_id)
        );
        self.client.get(&path, &[]).await
    }
}

/// Type tag of a question item: the first key of `question` ending in
/// `Question` ("textQuestion", "choiceQuestion", ...), else "unknown".
pub fn question_type(item: &Value) -> String {
    item.get("questionItem")
        .and_then(|q| q.get("question"))
        .and_then(Value::as_object)
        .and_then(|q| q.keys().find(|k| k.ends_with("Question")).cloned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Flatten a response's `answers` map into `{questionId: [text values]}`.
pub fn answer_values(response: &Value) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(answers) = response.get("answers").and_then(Value::as_object) {
        for (question_id, answer) in answers {
            let values: Vec<Value> = answer
                .get("textAnswers")
                .map(|t| extract_array(t, "answers"))
                .unwrap_or_default()
                .iter()
                .map(|a| a.get("value").cloned().unwrap_or(json!("")))
                .collect();
            out.insert(question_id.clone(), Value::Array(values));
        }
    }
    Value::Object(out)
}

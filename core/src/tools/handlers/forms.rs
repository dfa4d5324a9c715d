//! Google Forms tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{done, field};
use crate::common::{GoogleResultExt, ToolError, ToolResult};
use crate::google::common::extract_array;
use crate::google::forms::{answer_values, question_type, QuestionKind};
use crate::google::FormsApi;
use crate::tools::args::{decode, lenient_u32};
use crate::tools::registry::{descriptor, ToolDescriptor};

fn default_question_type() -> String {
    "SHORT_ANSWER".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFormArgs {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormIdArgs {
    pub form_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddQuestionArgs {
    pub form_id: String,
    pub question_title: String,
    #[serde(default = "default_question_type")]
    pub question_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub index: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseArgs {
    pub form_id: String,
    pub response_id: String,
}

#[derive(Debug)]
pub enum FormsCall {
    CreateForm(CreateFormArgs),
    GetForm(FormIdArgs),
    AddQuestion {
        args: AddQuestionArgs,
        question: Value,
    },
    GetResponses(FormIdArgs),
    GetResponse(ResponseArgs),
}

impl FormsCall {
    pub fn parse(tool: &str, action: &str, args: Value) -> ToolResult<Self> {
        Ok(match action {
            "create_form" => Self::CreateForm(decode(tool, args)?),
            "get_form" => Self::GetForm(decode(tool, args)?),
            "add_question" => {
                let args: AddQuestionArgs = decode(tool, args)?;
                let kind = QuestionKind::parse(&args.question_type).ok_or_else(|| {
                    ToolError::invalid(
                        tool,
                        format!(
                            "unsupported question_type '{}' (expected one of {})",
                            args.question_type,
                            QuestionKind::NAMES.join(", ")
                        ),
                    )
                })?;
                let question = kind.question_body(args.required, &args.choices).ok_or_else(|| {
                    ToolError::invalid(
                        tool,
                        format!("`choices` is required for {} questions", args.question_type),
                    )
                })?;
                Self::AddQuestion { args, question }
            }
            "get_responses" => Self::GetResponses(decode(tool, args)?),
            "get_response" => Self::GetResponse(decode(tool, args)?),
            _ => return Err(ToolError::UnknownTool(tool.to_string())),
        })
    }

    pub async fn execute(self, forms: &FormsApi) -> ToolResult<Value> {
        match self {
            Self::CreateForm(args) => {
                let form = forms
                    .create_form(&args.title, args.description.as_deref())
                    .await
                    .context("Failed to create form")?;
                Ok(json!({
                    "success": true,
                    "form_id": field(&form, "formId"),
                    "responder_uri": field(&form, "responderUri"),
                    "title": form
                        .get("info")
                        .map(|i| field(i, "title"))
                        .unwrap_or_else(|| json!(args.title)),
                }))
            }
            Self::GetForm(args) => {
                let form = forms
                    .get_form(&args.form_id)
                    .await
                    .context("Failed to get form")?;
                let info = form.get("info").cloned().unwrap_or_else(|| json!({}));
                let questions: Vec<Value> = extract_array(&form, "items")
                    .iter()
                    .filter(|item| item.get("questionItem").is_some())
                    .map(|item| {
                        json!({
                            "questionId": item
                                .pointer("/questionItem/question/questionId")
                                .cloned()
                                .unwrap_or_else(|| json!("")),
                            "title": field(item, "title"),
                            "type": question_type(item),
                        })
                    })
                    .collect();
                Ok(json!({
                    "success": true,
                    "form_id": field(&form, "formId"),
                    "title": field(&info, "title"),
                    "description": field(&info, "description"),
                    "responder_uri": field(&form, "responderUri"),
                    "questions": questions,
                }))
            }
            Self::AddQuestion { args, question } => {
                forms
                    .create_item(&args.form_id, &args.question_title, question, args.index)
                    .await
                    .context("Failed to add question")?;
                Ok(done(format!("Question '{}' added", args.question_title)))
            }
            Self::GetResponses(args) => {
                let responses = forms
                    .list_responses(&args.form_id)
                    .await
                    .context("Failed to get responses")?;
                let responses: Vec<Value> = responses.iter().map(response_summary).collect();
                Ok(json!({
                    "success": true,
                    "form_id": args.form_id,
                    "total_responses": responses.len(),
                    "responses": responses,
                }))
            }
            Self::GetResponse(args) => {
                let response = forms
                    .get_response(&args.form_id, &args.response_id)
                    .await
                    .context("Failed to get response")?;
                let mut out = response_summary(&response);
                out["success"] = json!(true);
                Ok(out)
            }
        }
    }
}

fn response_summary(response: &Value) -> Value {
    json!({
        "response_id": field(response, "responseId"),
        "create_time": field(response, "createTime"),
        "last_submitted_time": field(response, "lastSubmittedTime"),
        "answers": answer_values(response),
    })
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    let form_id = json!({ "type": "string", "description": "Form ID" });
    vec![
        descriptor(
            "forms_create_form",
            "Create a new Google Form.",
            json!({
                "title": { "type": "string" },
                "description": { "type": "string", "description": "Stored as the form's document title" }
            }),
            &["title"],
        ),
        descriptor(
            "forms_get_form",
            "Get a form's title, description, link and questions.",
            json!({ "form_id": form_id.clone() }),
            &["form_id"],
        ),
        descriptor(
            "forms_add_question",
            "Insert a question into a form.",
            json!({
                "form_id": form_id.clone(),
                "question_title": { "type": "string" },
                "question_type": {
                    "type": "string",
                    "enum": QuestionKind::NAMES,
                    "default": "SHORT_ANSWER"
                },
                "required": { "type": "boolean", "default": false },
                "choices": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Options for MULTIPLE_CHOICE, CHECKBOX and DROP_DOWN"
                },
                "index": { "type": "integer", "minimum": 0, "default": 0 }
            }),
            &["form_id", "question_title"],
        ),
        descriptor(
            "forms_get_responses",
            "List the responses submitted to a form.",
            json!({ "form_id": form_id.clone() }),
            &["form_id"],
        ),
        descriptor(
            "forms_get_response",
            "Get one form response.",
            json!({ "form_id": form_id, "response_id": { "type": "string" } }),
            &["form_id", "response_id"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;

    fn add(args: Value) -> ToolResult<FormsCall> {
        FormsCall::parse("forms_add_question", "add_question", args)
    }

    #[test]
    fn choice_question_needs_choices() {
        let err = add(json!({"form_id": "F", "question_title": "Pick", "question_type": "CHECKBOX"}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("choices"));
    }

    #[test]
    fn unknown_question_type_is_invalid() {
        let err = add(json!({"form_id": "F", "question_title": "Rate", "question_type": "SCALE"}))
            .unwrap_err();
        assert!(err.to_string().contains("SCALE"));
    }

    #[test]
    fn defaults_to_short_answer_at_top() {
        let call = add(json!({"form_id": "F", "question_title": "Name"})).unwrap();
        let FormsCall::AddQuestion { args, question } = call else {
            panic!("expected AddQuestion");
        };
        assert_eq!(args.index, 0);
        assert_eq!(question["textQuestion"]["paragraph"], false);
        assert_eq!(question["required"], false);
    }

    #[test]
    fn response_summary_shape() {
        let out = response_summary(&json!({
            "responseId": "r1",
            "answers": {"q": {"textAnswers": {"answers": [{"value": "42"}]}}}
        }));
        assert_eq!(out, json!({
            "response_id": "r1",
            "create_time": "",
            "last_submitted_time": "",
            "answers": {"q": ["42"]}
        }));
    }
}

//! Dish Q&A flow.
//!
//! A `DishConversation` holds the history for one dish. Each question
//! streams an answer (`text` frames); on success the question and the
//! answer are appended to the history sent with the next question.

use serde::{Deserialize, Serialize};

use crate::client::MenuClient;
use crate::session::FlowState;
use crate::stream::ItemFields;
use crate::transport::{self, ChunkSource};

pub const ASK_FAILURE: &str = "Could not get an answer, please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/ask-dish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DishQuestion {
    pub dish_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_description: Option<String>,
    pub question: String,
    pub conversation_history: Vec<ConversationTurn>,
    pub user_language: String,
}

#[derive(Debug, Clone)]
pub struct DishConversation {
    dish_name: String,
    dish_description: Option<String>,
    user_language: String,
    history: Vec<ConversationTurn>,
    answer: String,
    state: FlowState,
}

impl DishConversation {
    pub fn new(dish_name: impl Into<String>, user_language: impl Into<String>) -> Self {
        Self {
            dish_name: dish_name.into(),
            dish_description: None,
            user_language: user_language.into(),
            history: Vec::new(),
            answer: String::new(),
            state: FlowState::default(),
        }
    }

    /// Start a conversation about a parsed menu item. The translated name
    /// is what the user sees, so that is what gets asked about.
    pub fn for_item(fields: &ItemFields, user_language: impl Into<String>) -> Self {
        let name = if fields.translated_name.is_empty() {
            &fields.original_name
        } else {
            &fields.translated_name
        };
        let mut conversation = Self::new(name.clone(), user_language);
        conversation.dish_description = fields.note().map(str::to_string);
        conversation
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.dish_description = (!description.trim().is_empty()).then_some(description);
        self
    }

    pub fn dish_name(&self) -> &str {
        &self.dish_name
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Answer to the current (or last) question, partial while streaming.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    /// Request body for `question`, carrying the history so far.
    pub fn question(&self, question: &str) -> DishQuestion {
        DishQuestion {
            dish_name: self.dish_name.clone(),
            dish_description: self.dish_description.clone(),
            question: question.trim().to_string(),
            conversation_history: self.history.clone(),
            user_language: self.user_language.clone(),
        }
    }

    fn begin(&mut self) {
        self.answer.clear();
        self.state.start();
    }

    fn finish(&mut self, question: &str) {
        if !self.state.complete() {
            return;
        }
        self.history.push(ConversationTurn {
            role: Role::User,
            content: question.to_string(),
        });
        self.history.push(ConversationTurn {
            role: Role::Assistant,
            content: self.answer.trim().to_string(),
        });
    }
}

/// Stream one answer into `conversation`. `on_text` sees the answer so far
/// after every piece of text.
pub async fn consume_answer_stream<S, F>(
    source: &mut S,
    conversation: &mut DishConversation,
    question: &str,
    mut on_text: F,
) where
    S: ChunkSource,
    F: FnMut(&str),
{
    conversation.begin();
    let answer = &mut conversation.answer;
    let result = transport::read_text_frames(source, |text| {
        answer.push_str(text);
        on_text(answer.as_str());
    })
    .await;

    match result {
        Ok(()) => {
            log::info!(
                "[ASK] Answer complete: {} chars",
                conversation.answer.chars().count()
            );
            conversation.finish(question);
        }
        Err(e) => {
            log::error!("[ASK] Stream failed: {}", e);
            conversation.state.fail(e.user_message(ASK_FAILURE));
        }
    }
}

/// Ask `question` about the conversation's dish.
pub async fn ask_dish<F>(
    client: &MenuClient,
    conversation: &mut DishConversation,
    question: &str,
    on_text: F,
) where
    F: FnMut(&str),
{
    let body = conversation.question(question);
    if body.question.is_empty() {
        log::debug!("[ASK] Ignoring empty question");
        return;
    }

    let start = std::time::Instant::now();
    match client.ask_dish(&body).await {
        Ok(mut source) => {
            consume_answer_stream(&mut source, conversation, &body.question, on_text).await;
        }
        Err(e) => {
            log::error!("[ASK] Request failed: {}", e);
            conversation.begin();
            conversation.state.fail(e.user_message(ASK_FAILURE));
        }
    }
    log::info!(
        "[ASK] {} finished in {}ms: {:?}",
        conversation.dish_name,
        start.elapsed().as_millis(),
        conversation.state()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryChunkSource;

    fn text_frame(text: &str) -> String {
        format!("data: {}\n\n", serde_json::json!({ "text": text }))
    }

    #[test]
    fn question_body_shape() {
        let conversation = DishConversation::new("Mapo tofu", "en").with_description("Spicy tofu");
        let json = serde_json::to_value(conversation.question("  Is it vegan? ")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "dishName": "Mapo tofu",
                "dishDescription": "Spicy tofu",
                "question": "Is it vegan?",
                "conversationHistory": [],
                "userLanguage": "en"
            })
        );
    }

    #[test]
    fn description_is_omitted_when_absent() {
        let json = serde_json::to_value(DishConversation::new("Tea", "sv").question("Hot?")).unwrap();
        assert!(json.get("dishDescription").is_none());
    }

    #[test]
    fn for_item_uses_translated_name_and_real_note() {
        let fields = ItemFields::parse("麻婆豆腐 | Mapo tofu | 38 | 暂无解读").unwrap();
        let conversation = DishConversation::for_item(&fields, "en");
        assert_eq!(conversation.dish_name(), "Mapo tofu");
        assert!(conversation.question("?").dish_description.is_none());
    }

    #[tokio::test]
    async fn answer_streams_and_extends_history() {
        let mut conversation = DishConversation::new("Mapo tofu", "en");
        let mut source = MemoryChunkSource::new([
            text_frame("It contains "),
            text_frame("minced pork."),
            "data: [DONE]\n\n".to_string(),
        ]);
        let mut partials = Vec::new();
        consume_answer_stream(&mut source, &mut conversation, "Is it vegan?", |a| {
            partials.push(a.to_string())
        })
        .await;

        assert_eq!(partials, vec!["It contains ", "It contains minced pork."]);
        assert_eq!(conversation.state(), &FlowState::Completed);
        assert_eq!(
            conversation.history(),
            &[
                ConversationTurn {
                    role: Role::User,
                    content: "Is it vegan?".to_string()
                },
                ConversationTurn {
                    role: Role::Assistant,
                    content: "It contains minced pork.".to_string()
                },
            ]
        );
        let json = serde_json::to_value(conversation.question("Spicy?")).unwrap();
        assert_eq!(json["conversationHistory"][0]["role"], "user");
        assert_eq!(json["conversationHistory"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn failure_leaves_history_untouched() {
        let mut conversation = DishConversation::new("Tea", "en");
        let mut source = MemoryChunkSource::new([text_frame("Ye")]).failing_with("reset");
        consume_answer_stream(&mut source, &mut conversation, "Hot?", |_| {}).await;
        assert_eq!(conversation.error(), Some(ASK_FAILURE));
        assert!(conversation.history().is_empty());
        assert_eq!(conversation.answer(), "Ye");
    }
}

use super::*;
use crate::knowledge::{KnowledgeEntry, parse_entries};
use anyhow::anyhow;
use std::sync::{Arc, Mutex};

const FRENCH_QUESTION: &str = "Bonjour, je voudrais savoir comment je peux poser des jours de congés payés cet été avec mon responsable.";
const ENGLISH_QUESTION: &str =
    "Hello, I would like to know how I can request paid leave days this summer with my manager.";
const GERMAN_QUESTION: &str = "Guten Tag, ich möchte gerne wissen, wie ich in diesem Sommer bezahlten Urlaub bei meinem Vorgesetzten beantragen kann.";

const KNOWLEDGE: &str = r#"[
    {"category": "Paie", "subcategory": "Bulletin", "question": "Comment récupérer ma fiche de paie ?", "answer": "Sur le portail RH, rubrique documents.", "paraphrases": ["Où trouver mon bulletin de salaire ?"]},
    {"category": "Congés", "subcategory": "Demande", "question": "Comment poser des congés ?", "answer": "Faites la demande dans l'outil de gestion des temps.", "paraphrases": []},
    {"category": "Mutuelle", "subcategory": "Optique", "question": "Quel est le remboursement pour les lunettes ?", "answer": "Jusqu'à 150 euros tous les deux ans.", "paraphrases": []}
]"#;

#[derive(Clone, Default)]
struct RecordingChat {
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl RecordingChat {
    fn recorded(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("lock not poisoned").clone()
    }
}

impl ChatModel for RecordingChat {
    fn complete(&self, request: &ChatRequest) -> anyhow::Result<String> {
        self.requests
            .lock()
            .expect("lock not poisoned")
            .push(request.clone());
        Ok("Via le portail RH.".to_string())
    }
}

struct FailingChat;

impl ChatModel for FailingChat {
    fn complete(&self, _request: &ChatRequest) -> anyhow::Result<String> {
        Err(anyhow!("Client error: HTTP 401"))
    }
}

fn assistant_with(
    knowledge: LoadedKnowledge,
    chat: Box<dyn ChatModel>,
    settings: AnswerSettings,
) -> HrAssistant {
    HrAssistant::from_parts(knowledge, Box::new(HashEmbedder::default()), chat, settings)
        .expect("assistant builds")
}

fn hr_assistant(chat: &RecordingChat) -> HrAssistant {
    assistant_with(
        parse_entries(KNOWLEDGE).expect("knowledge parses"),
        Box::new(chat.clone()),
        AnswerSettings::default(),
    )
}

fn prompt_for(assistant: &HrAssistant, question: &str) -> Prompt {
    match assistant.compose(question, 3).expect("compose succeeds") {
        Composition::Prompt(composed) => composed,
        Composition::NoMatch { .. } => panic!("expected retrieved context"),
    }
}

#[test]
fn payslip_question_cites_its_source() {
    let chat = RecordingChat::default();
    let knowledge = LoadedKnowledge {
        entries: vec![KnowledgeEntry::new(
            "Payroll",
            "Payslip",
            "How do I get my payslip?",
            "Via the HR portal.",
            Vec::new(),
        )],
        skipped: 0,
    };
    let assistant = assistant_with(knowledge, Box::new(chat.clone()), AnswerSettings::default());

    let answer = assistant
        .query("How can I get my payslip?", 3)
        .expect("query succeeds");

    match &answer {
        Answer::Generated { text, sources, .. } => {
            assert_eq!(sources, &vec!["Payroll - Payslip".to_string()]);
            assert!(text.starts_with("Via le portail RH."));
            assert!(text.ends_with("📚 **Sources consultées:**\n• Payroll - Payslip\n"));
        }
        other => panic!("expected a generated answer, got {other:?}"),
    }
    assert_eq!(chat.recorded().len(), 1);
}

#[test]
fn empty_knowledge_base_always_apologises_in_french() {
    let chat = RecordingChat::default();
    let assistant = assistant_with(
        LoadedKnowledge::default(),
        Box::new(chat.clone()),
        AnswerSettings::default(),
    );

    for question in [ENGLISH_QUESTION, FRENCH_QUESTION, "How can I check my leave balance?"] {
        let answer = assistant.query(question, 3).expect("query succeeds");
        assert_eq!(
            answer,
            Answer::NoMatch {
                text: prompt::NO_MATCH_FR.to_string()
            }
        );
    }
    assert!(chat.recorded().is_empty());
}

#[test]
fn detected_no_match_language_follows_question() {
    let settings = AnswerSettings {
        no_match_language: NoMatchLanguage::Detected,
        ..AnswerSettings::default()
    };
    let assistant = assistant_with(
        LoadedKnowledge::default(),
        Box::new(RecordingChat::default()),
        settings,
    );

    let english = assistant.query(ENGLISH_QUESTION, 3).expect("query succeeds");
    let french = assistant.query(FRENCH_QUESTION, 3).expect("query succeeds");

    assert_eq!(english.text(), prompt::NO_MATCH_EN);
    assert_eq!(french.text(), prompt::NO_MATCH_FR);
}

#[test]
fn french_question_uses_french_prompt() {
    let chat = RecordingChat::default();
    let assistant = hr_assistant(&chat);
    let composed = prompt_for(&assistant, FRENCH_QUESTION);

    assert_eq!(composed.language, Language::French);
    assert_eq!(composed.request.messages[0], ChatMessage::system(prompt::persona(Language::French)));
    assert!(composed.request.messages[1].content.contains("Question de l'employé:"));
}

#[test]
fn english_question_uses_english_prompt() {
    let chat = RecordingChat::default();
    let assistant = hr_assistant(&chat);
    let composed = prompt_for(&assistant, ENGLISH_QUESTION);

    assert_eq!(composed.language, Language::English);
    assert_eq!(
        composed.request.messages[0].content,
        "You are an expert and helpful HR assistant."
    );
    assert!(composed.request.messages[1].content.contains("Employee question:"));
}

#[test]
fn other_languages_use_english_prompt() {
    let chat = RecordingChat::default();
    let assistant = hr_assistant(&chat);
    let composed = prompt_for(&assistant, GERMAN_QUESTION);

    assert_eq!(composed.language, Language::English);
    assert!(composed.request.messages[1].content.starts_with("You are an expert"));
}

#[test]
fn undetectable_question_falls_back_to_french() {
    let chat = RecordingChat::default();
    let assistant = hr_assistant(&chat);
    let composed = prompt_for(&assistant, "");

    assert_eq!(composed.language, Language::French);
    assert!(composed.request.messages[1].content.contains("Contexte RH disponible:"));
}

#[test]
fn request_carries_generation_settings() {
    let chat = RecordingChat::default();
    let assistant = hr_assistant(&chat);
    let composed = prompt_for(&assistant, FRENCH_QUESTION);

    assert_eq!(composed.request.model, "llama-3.1-8b-instant");
    assert!((composed.request.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(composed.request.max_tokens, 1024);
    assert_eq!(composed.request.messages.len(), 2);
    assert_eq!(composed.sources.len(), 3);
    assert_eq!(composed.positions.len(), 3);
}

#[test]
fn k_limits_context_and_sources() {
    let chat = RecordingChat::default();
    let assistant = hr_assistant(&chat);

    match assistant.compose("fiche de paie", 1).expect("compose succeeds") {
        Composition::Prompt(composed) => {
            assert_eq!(composed.sources, vec!["Paie - Bulletin".to_string()]);
            assert_eq!(composed.context.matches("Catégorie:").count(), 1);
        }
        Composition::NoMatch { .. } => panic!("expected retrieved context"),
    }
}

#[test]
fn identical_questions_compose_identically() {
    let chat = RecordingChat::default();
    let assistant = hr_assistant(&chat);

    let first = assistant.compose(FRENCH_QUESTION, 3).expect("compose succeeds");
    let second = assistant.compose(FRENCH_QUESTION, 3).expect("compose succeeds");

    assert_eq!(first, second);
}

#[test]
fn model_failure_becomes_failed_answer() {
    let assistant = assistant_with(
        parse_entries(KNOWLEDGE).expect("knowledge parses"),
        Box::new(FailingChat),
        AnswerSettings::default(),
    );

    let answer = assistant
        .query(FRENCH_QUESTION, 3)
        .expect("failure is not an error");

    assert!(!answer.is_generated());
    assert_eq!(
        answer,
        Answer::Failed {
            text: "Erreur lors de la génération de la réponse: Client error: HTTP 401".to_string(),
            error: "Client error: HTTP 401".to_string(),
        }
    );
}

#[test]
fn status_reports_load_counters() {
    let knowledge = parse_entries(
        r#"[{"question": "A ?", "answer": "a"}, {"question": " ", "answer": ""}]"#,
    )
    .expect("knowledge parses");
    let assistant = assistant_with(
        knowledge,
        Box::new(RecordingChat::default()),
        AnswerSettings::default(),
    );

    assert_eq!(
        assistant.status(),
        AssistantStatus {
            entries: 1,
            skipped_entries: 1,
            truncated_inputs: 0,
        }
    );
    assert_eq!(assistant.default_top_k(), 3);
}

#[test]
fn from_config_requires_api_key_first() {
    let config = Config::default();
    let result = HrAssistant::from_config(&config);

    assert!(matches!(
        result,
        Err(AssistantError::Config(crate::config::ConfigError::MissingApiKey))
    ));
}

#[test]
fn answer_serialises_with_kind_tag() {
    let answer = Answer::NoMatch {
        text: prompt::NO_MATCH_FR.to_string(),
    };
    let json = serde_json::to_value(&answer).expect("answer serialises");

    assert_eq!(json["kind"], "no_match");
    assert_eq!(answer.into_text(), prompt::NO_MATCH_FR);
}

//! Fixed texts sent to, or returned instead of, the chat model


use crate::knowledge::KnowledgeEntry;
use crate::language::Language;

pub const NO_MATCH_FR: &str = "Désolé, je n'ai pas trouvé d'information pertinente dans ma base de connaissances RH. Pouvez-vous reformuler votre question ?";
pub const NO_MATCH_EN: &str = "Sorry, I could not find relevant information in my HR knowledge base. Could you rephrase your question?";

const PERSONA_FR: &str = "Vous êtes un assistant RH expert et bienveillant.";
const PERSONA_EN: &str = "You are an expert and helpful HR assistant.";

const INSTRUCTIONS_FR: &str = "Vous êtes un assistant RH expert et bienveillant. Votre rôle est d'aider les employés avec leurs questions relatives aux ressources humaines.

Instructions:
- Répondez de manière claire, précise et professionnelle
- Utilisez les informations du contexte fourni pour donner des réponses exactes
- Si l'information n'est pas dans le contexte, dites-le clairement
- Soyez empathique et serviable
- Répondez en français

Contexte RH disponible:
";

const INSTRUCTIONS_EN: &str = "You are an expert and helpful HR assistant. Your role is to help employees with their human resources questions.

Instructions:
- Answer clearly, precisely and professionally
- Use the information from the provided context to give accurate answers
- If the information is not in the context, state it clearly
- Be empathetic and helpful
- Respond in English

Available HR context:
";

const SOURCES_HEADER: &str = "\n\n📚 **Sources consultées:**\n";

/// Apology returned when retrieval yields nothing
#[inline]
pub fn no_match(language: Language) -> &'static str {
    match language {
        Language::French => NO_MATCH_FR,
        Language::English => NO_MATCH_EN,
    }
}

/// System message for the chat model
#[inline]
pub fn persona(language: Language) -> &'static str {
    match language {
        Language::French => PERSONA_FR,
        Language::English => PERSONA_EN,
    }
}

/// One block per matched entry, in match order, separated by a blank line.
#[inline]
pub fn build_context<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a KnowledgeEntry>,
{
    entries
        .into_iter()
        .map(|entry| {
            format!(
                "\nCatégorie: {} - {}\nQuestion: {}\nRéponse: {}\n",
                entry.category, entry.subcategory, entry.question, entry.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// User message: instructions, retrieved context and the employee question.
#[inline]
pub fn instruction(language: Language, context: &str, question: &str) -> String {
    match language {
        Language::French => format!(
            "{INSTRUCTIONS_FR}{context}\n\nQuestion de l'employé: {question}\n\nRéponse:"
        ),
        Language::English => format!(
            "{INSTRUCTIONS_EN}{context}\n\nEmployee question: {question}\n\nAnswer:"
        ),
    }
}

/// "Sources consultées" block appended to a generated answer
#[inline]
pub fn format_sources<S: AsRef<str>>(labels: &[S]) -> String {
    let mut block = String::from(SOURCES_HEADER);
    for label in labels {
        block.push_str("• ");
        block.push_str(label.as_ref());
        block.push('\n');
    }
    block
}

/// Text shown in place of an answer when the chat model call fails
#[inline]
pub fn generation_error(error: &anyhow::Error) -> String {
    format!("Erreur lors de la génération de la réponse: {error:#}")
}
